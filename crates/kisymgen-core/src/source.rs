//! Rows and the row source seam.

use std::collections::VecDeque;

use crate::error::{Location, Result};

/// One row of trimmed cells together with its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub cells: Vec<String>,
    pub location: Location,
}

impl Row {
    pub fn new(cells: Vec<String>, location: Location) -> Self {
        Self { cells, location }
    }

    /// The leading cell, empty when the row has no cells.
    pub fn lead(&self) -> &str {
        self.cells.first().map(String::as_str).unwrap_or("")
    }

    /// Pin rows leave the leading cell empty; symbol rows fill it.
    pub fn is_pin_row(&self) -> bool {
        self.lead().is_empty()
    }
}

/// Something that hands out rows in file order.
///
/// Blank and comment rows are the source's business; the core only ever
/// sees meaningful rows. `Ok(None)` marks the end of the stream.
pub trait RowSource {
    /// A short name for the stream, used in log output.
    fn name(&self) -> &str;

    fn next_row(&mut self) -> Result<Option<Row>>;
}

/// A row source backed by rows already in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    name: String,
    rows: VecDeque<Row>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, rows: impl IntoIterator<Item = Row>) -> Self {
        Self {
            name: name.into(),
            rows: rows.into_iter().collect(),
        }
    }

    /// Build rows by splitting each line on `,`.
    ///
    /// Cells are trimmed; blank lines and lines whose first non-empty cell
    /// starts with `#` are skipped but still advance the line counter.
    /// There is no quoting support, which keeps fixtures readable.
    pub fn from_lines(name: impl Into<String>, lines: &[&str]) -> Self {
        let name = name.into();
        let mut rows = VecDeque::new();
        let mut record = 0;
        for (idx, line) in lines.iter().enumerate() {
            let cells: Vec<String> = line.split(',').map(|c| c.trim().to_string()).collect();
            record += 1;
            match cells.iter().find(|c| !c.is_empty()) {
                None => continue,
                Some(first) if first.starts_with('#') => continue,
                Some(_) => {}
            }
            rows.push_back(Row::new(cells, Location::new(name.clone(), idx + 1, record)));
        }
        Self { name, rows }
    }
}

impl RowSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        Ok(self.rows.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_lines_skips_blank_and_comment_rows() {
        let mut src = MemorySource::from_lines(
            "mem",
            &["symbol name,footprint", "", "# comment,x", " ,pin number "],
        );
        let first = src.next_row().unwrap().unwrap();
        assert_eq!(first.cells, vec!["symbol name", "footprint"]);
        assert_eq!(first.location.line, 1);
        assert!(!first.is_pin_row());

        let second = src.next_row().unwrap().unwrap();
        assert_eq!(second.cells, vec!["", "pin number"]);
        assert_eq!(second.location.line, 4);
        assert_eq!(second.location.record, 4);
        assert!(second.is_pin_row());

        assert!(src.next_row().unwrap().is_none());
    }
}
