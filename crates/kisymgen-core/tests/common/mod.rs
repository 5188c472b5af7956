#![allow(dead_code)]

use kisymgen_core::{Location, MemorySource, PlacedSymbol, Row, Run, StreamReport};

/// Header pair shared by most fixtures. Cells are separated by `|` so bus
/// lists can use commas.
pub const HEADERS: [&str; 2] = [
    "symbol name|footprint|datasheet|description|keywords|derive from|kicad extends|min width",
    "|pin category|pin number|pin name|pin gr type|pin el type|pin stacked|pin hidden",
];

/// In-memory stream from `|` separated lines, headers included.
pub fn table(name: &str, lines: &[&str]) -> MemorySource {
    let rows = lines.iter().enumerate().map(|(idx, line)| {
        Row::new(
            line.split('|').map(|cell| cell.trim().to_string()).collect(),
            Location::new(name, idx + 1, idx + 1),
        )
    });
    MemorySource::new(name, rows)
}

/// Prefix `body` with [`HEADERS`].
pub fn library(name: &str, body: &[&str]) -> MemorySource {
    setup_log();
    let mut lines = HEADERS.to_vec();
    lines.extend_from_slice(body);
    table(name, &lines)
}

/// Route `log` output through the test harness. `RUST_LOG` picks the level.
pub fn setup_log() {
    env_logger::Builder::from_default_env()
        .is_test(true)
        .try_init()
        .ok();
}

/// Process one stream in a fresh run.
pub fn run_one(body: &[&str]) -> (Run, StreamReport, Vec<PlacedSymbol>) {
    let mut run = Run::new();
    let mut out = Vec::new();
    let report = run
        .process_stream(&mut library("lib.csv", body), &mut out)
        .unwrap();
    (run, report, out)
}

pub fn numbers(symbol: &PlacedSymbol) -> Vec<&str> {
    symbol.pins.iter().map(|p| p.number.as_str()).collect()
}

pub fn find<'a>(symbols: &'a [PlacedSymbol], name: &str) -> &'a PlacedSymbol {
    symbols
        .iter()
        .find(|s| s.name == name)
        .unwrap_or_else(|| panic!("symbol {name} was not emitted"))
}
