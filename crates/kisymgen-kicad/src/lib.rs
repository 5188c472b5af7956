//! Write placed symbols as a KiCad symbol library (`.kicad_sym`).
//!
//! [`KicadLibraryWriter`] collects symbols through the
//! [`SymbolEmitter`] seam and renders them in emission order.

pub mod symbol;

use std::io::Write;
use std::path::{Path, PathBuf};

use kisymgen_core::{PlacedSymbol, SymbolEmitter};
use kisymgen_sexpr::{format_sexpr, Sexpr};
use tempfile::NamedTempFile;
use thiserror::Error;

pub use symbol::{grid_to_mm, mil_to_mm, symbol_to_sexpr};

/// File format version written into the library header.
pub const LIBRARY_VERSION: &str = "20231120";

pub const GENERATOR: &str = "kisymgen";

/// File extension of KiCad symbol libraries.
pub const EXTENSION: &str = "kicad_sym";

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("Failed to write symbol library {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WriteError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        WriteError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Collects emitted symbols and renders the library file.
#[derive(Debug, Default, Clone)]
pub struct KicadLibraryWriter {
    symbols: Vec<PlacedSymbol>,
}

impl KicadLibraryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn symbols(&self) -> &[PlacedSymbol] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn to_sexpr(&self) -> Sexpr {
        let mut items = vec![
            Sexpr::form("version", [Sexpr::symbol(LIBRARY_VERSION)]),
            Sexpr::form("generator", [Sexpr::string(GENERATOR)]),
        ];
        items.extend(self.symbols.iter().map(symbol_to_sexpr));
        Sexpr::form("kicad_symbol_lib", items)
    }

    pub fn render(&self) -> String {
        let mut text = format_sexpr(&self.to_sexpr(), 0);
        text.push('\n');
        text
    }

    /// Write the library to `path`.
    ///
    /// The content goes to a temporary file next to `path` first, so an
    /// existing library is only replaced once the new one is complete.
    pub fn write_to(&self, path: &Path) -> Result<(), WriteError> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut file = NamedTempFile::new_in(dir).map_err(|e| WriteError::io(path, e))?;
        file.write_all(self.render().as_bytes())
            .map_err(|e| WriteError::io(path, e))?;
        file.persist(path).map_err(|e| WriteError::io(path, e.error))?;
        log::info!(
            "Wrote {} symbol(s) to {}",
            self.symbols.len(),
            path.display()
        );
        Ok(())
    }
}

impl SymbolEmitter for KicadLibraryWriter {
    fn emit(&mut self, symbol: PlacedSymbol) {
        log::debug!("Emitting symbol {:?}", symbol.name);
        self.symbols.push(symbol);
    }
}

/// `<name>.kicad_sym`, unless `name` already carries the extension.
pub fn library_path(name: &str) -> PathBuf {
    let path = PathBuf::from(name);
    if path.extension().is_some_and(|ext| ext == EXTENSION) {
        path
    } else {
        PathBuf::from(format!("{name}.{EXTENSION}"))
    }
}
