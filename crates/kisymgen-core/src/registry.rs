use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::symbol::Symbol;

/// Every symbol resolved so far in a run, in insertion order.
///
/// Later symbols refer to earlier ones by name. Entries are never removed
/// or replaced.
#[derive(Debug, Default)]
pub struct SymbolRegistry {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, usize>,
}

impl SymbolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.by_name.get(name).map(|&idx| &self.symbols[idx])
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Add a symbol. A second symbol with the same name is a `SymbolError`.
    pub fn insert(&mut self, symbol: Symbol) -> Result<()> {
        if self.contains(symbol.name()) {
            return Err(Error::symbol(
                format!("Symbol with name {:?} already exists!", symbol.name()),
                &symbol.location,
            ));
        }
        self.by_name.insert(symbol.name().to_string(), self.symbols.len());
        self.symbols.push(symbol);
        Ok(())
    }

    /// Follow `kicad extends` links up to the first symbol that has a body.
    pub fn extension_root<'a>(&'a self, symbol: &'a Symbol) -> Result<&'a Symbol> {
        let mut current = symbol;
        while let Some(parent) = current.extends() {
            current = self.get(parent).ok_or_else(|| {
                Error::logic(
                    format!("Extended symbol {parent:?} is not registered"),
                    &symbol.location,
                )
            })?;
        }
        Ok(current)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.iter().map(Symbol::name)
    }
}
