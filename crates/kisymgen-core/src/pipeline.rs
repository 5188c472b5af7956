//! Drive rows from a source through to an emitter.

use serde::Serialize;

use crate::derive;
use crate::error::{Error, Location, Result, Severity};
use crate::geometry;
use crate::placed::PlacedSymbol;
use crate::record::{self, PinContext};
use crate::registry::SymbolRegistry;
use crate::schema::{HeaderMap, HeaderRole, PIN_COLUMNS, SYMBOL_COLUMNS};
use crate::source::{Row, RowSource};

/// Receives every symbol that resolved and was laid out.
pub trait SymbolEmitter {
    fn emit(&mut self, symbol: PlacedSymbol);
}

impl SymbolEmitter for Vec<PlacedSymbol> {
    fn emit(&mut self, symbol: PlacedSymbol) {
        self.push(symbol);
    }
}

/// Outcome of one input stream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StreamReport {
    pub source: String,
    pub symbols: usize,
    pub failures: usize,
    pub skipped_pin_rows: usize,
    pub rows: usize,
    /// The header or source error that ended the stream early.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_error")]
    pub aborted: Option<Error>,
}

fn serialize_error<S: serde::Serializer>(error: &Option<Error>, s: S) -> Result<S::Ok, S::Error> {
    match error {
        Some(error) => s.serialize_str(&error.to_string()),
        None => s.serialize_none(),
    }
}

/// Totals over all streams of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub streams: Vec<StreamReport>,
    pub symbols: usize,
}

impl RunSummary {
    pub fn failures(&self) -> usize {
        self.streams.iter().map(|s| s.failures).sum()
    }

    pub fn skipped_pin_rows(&self) -> usize {
        self.streams.iter().map(|s| s.skipped_pin_rows).sum()
    }

    pub fn aborted_streams(&self) -> usize {
        self.streams.iter().filter(|s| s.aborted.is_some()).count()
    }

    /// No failures, no aborted streams and no skipped pin rows.
    pub fn is_success(&self) -> bool {
        self.failures() == 0 && self.aborted_streams() == 0 && self.skipped_pin_rows() == 0
    }
}

/// Wraps a row source so the report sees every row that was read.
struct Counted<'s> {
    source: &'s mut dyn RowSource,
    rows: usize,
    last: Location,
}

impl Counted<'_> {
    fn next(&mut self) -> Result<Option<Row>> {
        let row = self.source.next_row()?;
        if let Some(row) = &row {
            self.rows += 1;
            self.last = row.location.clone();
        }
        Ok(row)
    }

    fn require(&mut self) -> Result<Row> {
        self.next()?
            .ok_or_else(|| Error::header("Premature end of input!", &self.last))
    }
}

/// One run over any number of streams, sharing a registry.
#[derive(Debug, Default)]
pub struct Run {
    registry: SymbolRegistry,
    reports: Vec<StreamReport>,
}

impl Run {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registry(&self) -> &SymbolRegistry {
        &self.registry
    }

    /// Read one stream to its end.
    ///
    /// Symbol, pin and validation errors are recorded and the stream
    /// continues at the next symbol row. Header and source errors end the
    /// stream. Only a logic error is returned.
    pub fn process_stream(
        &mut self,
        source: &mut dyn RowSource,
        emitter: &mut dyn SymbolEmitter,
    ) -> Result<StreamReport> {
        let mut report = StreamReport {
            source: source.name().to_string(),
            ..StreamReport::default()
        };
        let mut rows = Counted {
            source,
            rows: 0,
            last: Location::new(report.source.clone(), 0, 0),
        };

        let outcome = self.read_stream(&mut rows, emitter, &mut report);
        report.rows = rows.rows;
        match outcome {
            Ok(()) => {}
            Err(err) if err.severity() == Severity::StreamFatal => {
                log::error!("{err}");
                report.aborted = Some(err);
            }
            Err(err) => {
                self.reports.push(report);
                return Err(err);
            }
        }

        log::info!(
            "End of {:?}: {} symbol(s) generated, {} failure(s), {} row(s) read, {} pin row(s) skipped",
            report.source,
            report.symbols,
            report.failures,
            report.rows,
            report.skipped_pin_rows
        );
        self.reports.push(report.clone());
        Ok(report)
    }

    fn read_stream(
        &mut self,
        rows: &mut Counted<'_>,
        emitter: &mut dyn SymbolEmitter,
        report: &mut StreamReport,
    ) -> Result<()> {
        let symbol_header = HeaderMap::validate(&rows.require()?, SYMBOL_COLUMNS, HeaderRole::Symbol)?;
        let pin_header = HeaderMap::validate(&rows.require()?, PIN_COLUMNS, HeaderRole::Pin)?;

        let mut pending = rows.next()?;
        loop {
            let symbol_row = match pending.take() {
                None => return Ok(()),
                Some(row) if row.is_pin_row() => {
                    log::warn!("Pin row without symbol skipped {}", row.location);
                    report.skipped_pin_rows += 1;
                    pending = rows.next()?;
                    continue;
                }
                Some(row) => row,
            };

            let mut pin_rows = Vec::new();
            loop {
                match rows.next()? {
                    Some(row) if row.is_pin_row() => pin_rows.push(row),
                    other => {
                        pending = other;
                        break;
                    }
                }
            }

            let mut consumed = 0;
            match self.resolve_symbol(&symbol_header, &pin_header, &symbol_row, &pin_rows, &mut consumed) {
                Ok(placed) => {
                    emitter.emit(placed);
                    report.symbols += 1;
                }
                Err(err) if err.severity() == Severity::Recoverable => {
                    log::error!("{err}");
                    report.failures += 1;
                    report.skipped_pin_rows += pin_rows.len() - consumed;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Build, patch, place and register one symbol.
    ///
    /// `consumed` counts the pin rows that were looked at; rows after a
    /// failing one are reported as skipped.
    fn resolve_symbol(
        &mut self,
        symbol_header: &HeaderMap,
        pin_header: &HeaderMap,
        symbol_row: &Row,
        pin_rows: &[Row],
        consumed: &mut usize,
    ) -> Result<PlacedSymbol> {
        let mut symbol = record::build_symbol(symbol_header, symbol_row, &self.registry)?;

        if let (true, Some(first)) = (symbol.is_extension(), pin_rows.first()) {
            return Err(Error::symbol(
                format!("No pin definition allowed for an extension symbol: {:?}", symbol.name()),
                &first.location,
            ));
        }

        let derived = symbol.derives_from().is_some();
        let mut context = PinContext::default();
        let mut patch = Vec::new();
        for row in pin_rows {
            *consumed += 1;
            let pin = record::build_pin(pin_header, row, &context)?;
            context.remember(&pin);
            if derived {
                patch.push(pin);
            } else if pin.is_pseudo() {
                return Err(Error::pin(
                    format!("Pin Category: {:?} is not allowed for base symbols!", pin.category.as_str()),
                    &row.location,
                ));
            } else {
                symbol.pins.push(pin);
            }
        }

        if let Some(parent) = symbol.derives_from() {
            let parent = self.registry.get(parent).ok_or_else(|| {
                Error::logic(format!("Parent {parent:?} vanished from the registry"), &symbol.location)
            })?;
            symbol.pins = derive::resolve(&parent.pins, patch)?;
        }

        if self.registry.contains(symbol.name()) {
            return Err(Error::symbol(
                format!("Symbol with name {:?} already exists!", symbol.name()),
                &symbol.location,
            ));
        }
        let placed = geometry::place(&symbol, &self.registry)?;
        self.registry.insert(symbol)?;
        Ok(placed)
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            streams: self.reports.clone(),
            symbols: self.registry.len(),
        }
    }
}
