use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use clap::ValueEnum;
use kisymgen_core::{Error, Location, Result, Row, RowSource};

/// Named presets for [`CsvDialect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DialectPreset {
    /// Comma separated, `"` quoting with doubled quotes.
    Excel,
    /// Like `excel`, separated by tabs.
    ExcelTab,
    /// Like `excel`.
    Unix,
}

/// How the fields of an input file are separated and quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CsvDialect {
    pub delimiter: u8,
    /// `None` reads quote characters as plain text.
    pub quote: Option<u8>,
    /// `""` inside a quoted field is one `"`.
    pub double_quote: bool,
    pub escape: Option<u8>,
}

impl CsvDialect {
    pub fn preset(preset: DialectPreset) -> Self {
        let excel = Self {
            delimiter: b',',
            quote: Some(b'"'),
            double_quote: true,
            escape: None,
        };
        match preset {
            DialectPreset::Excel | DialectPreset::Unix => excel,
            DialectPreset::ExcelTab => Self {
                delimiter: b'\t',
                ..excel
            },
        }
    }

    fn reader_builder(&self) -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(false)
            .flexible(true)
            .delimiter(self.delimiter)
            .double_quote(self.double_quote)
            .escape(self.escape);
        match self.quote {
            Some(quote) => builder.quote(quote),
            None => builder.quoting(false),
        };
        builder
    }
}

impl Default for CsvDialect {
    fn default() -> Self {
        Self::preset(DialectPreset::Unix)
    }
}

fn show_byte(byte: Option<u8>) -> String {
    match byte {
        None => "none".to_string(),
        Some(b'\t') => "\\t".to_string(),
        Some(byte) => format!("{:?}", char::from(byte)),
    }
}

impl fmt::Display for CsvDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "delimiter: {}, quote: {}, double quote: {}, escape: {}",
            show_byte(Some(self.delimiter)),
            show_byte(self.quote),
            self.double_quote,
            show_byte(self.escape)
        )
    }
}

/// Rows of a delimited text file.
///
/// Records may have any length. Blank records and records whose first
/// non-empty cell starts with `#` never leave the source.
pub struct CsvRowSource<R: Read> {
    name: String,
    records: csv::StringRecordsIntoIter<R>,
}

impl CsvRowSource<File> {
    pub fn open(path: &Path, dialect: &CsvDialect) -> std::io::Result<Self> {
        let file = File::open(path)?;
        Ok(Self::from_reader(path.display().to_string(), file, dialect))
    }
}

impl<R: Read> CsvRowSource<R> {
    pub fn from_reader(name: impl Into<String>, reader: R, dialect: &CsvDialect) -> Self {
        let records = dialect.reader_builder().from_reader(reader).into_records();
        Self {
            name: name.into(),
            records,
        }
    }

    fn location(&self, position: Option<&csv::Position>) -> Location {
        match position {
            Some(pos) => Location::new(
                self.name.clone(),
                pos.line() as usize,
                pos.record() as usize + 1,
            ),
            None => Location::new(self.name.clone(), 0, 0),
        }
    }
}

fn is_skipped(cells: &[String]) -> bool {
    match cells.iter().find(|cell| !cell.is_empty()) {
        None => true,
        Some(first) => first.starts_with('#'),
    }
}

impl<R: Read> RowSource for CsvRowSource<R> {
    fn name(&self) -> &str {
        &self.name
    }

    fn next_row(&mut self) -> Result<Option<Row>> {
        while let Some(record) = self.records.next() {
            let record = record.map_err(|e| {
                let location = self.location(e.position());
                Error::row_source(format!("Malformed input: {e}"), &location)
            })?;
            let cells: Vec<String> = record.iter().map(|cell| cell.trim().to_string()).collect();
            if is_skipped(&cells) {
                continue;
            }
            let location = self.location(record.position());
            return Ok(Some(Row::new(cells, location)));
        }
        Ok(None)
    }
}
