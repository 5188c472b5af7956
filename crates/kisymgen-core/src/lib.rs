//! Turn tabular symbol descriptions into laid out schematic symbols.
//!
//! A stream starts with two header rows. The first names the symbol columns
//! and the second (with an empty leading cell) the pin columns. Every
//! following row either starts a symbol (leading cell filled) or adds a pin
//! to the current symbol (leading cell empty).
//!
//! The flow for one symbol is:
//!
//! * [`record`] validates and converts the symbol row and its pin rows,
//! * [`derive`] patches the parent's pins for `derive from` symbols,
//! * [`geometry`] sizes the body and places every pin on the grid,
//! * the result, a [`PlacedSymbol`], is handed to a [`SymbolEmitter`].
//!
//! [`Run`] drives that flow over any number of [`RowSource`]s and keeps the
//! shared [`SymbolRegistry`] so later streams may derive from earlier ones.

pub mod bus;
pub mod derive;
pub mod error;
pub mod geometry;
pub mod pin;
pub mod pipeline;
pub mod placed;
pub mod record;
pub mod registry;
pub mod schema;
pub mod source;
pub mod symbol;

pub use error::{Error, Location, Result, Severity};
pub use pipeline::{Run, RunSummary, StreamReport, SymbolEmitter};
pub use placed::PlacedSymbol;
pub use registry::SymbolRegistry;
pub use schema::{column_documentation, GRID_MM};
pub use source::{MemorySource, Row, RowSource};
