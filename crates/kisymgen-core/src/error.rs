use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Where a row came from. Attached to every entity and every error.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct Location {
    pub source: String,
    pub line: usize,
    pub record: usize,
}

impl Location {
    pub fn new(source: impl Into<String>, line: usize, record: usize) -> Self {
        Self {
            source: source.into(),
            line,
            record,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File: {:?} Record: {} Line: {}.",
            self.source, self.record, self.line
        )
    }
}

/// Errors produced while turning rows into placed symbols
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("HeaderError: {message} - {location}")]
    Header { message: String, location: Location },

    #[error("SymbolError: {message} - {location}")]
    Symbol { message: String, location: Location },

    #[error("PinError: {message} - {location}")]
    Pin { message: String, location: Location },

    #[error("ValidationError: {message} - {location}")]
    Validation { message: String, location: Location },

    #[error("LogicError: {message} - {location}")]
    Logic { message: String, location: Location },

    #[error("SourceError: {message} - {location}")]
    Source { message: String, location: Location },
}

/// How far an error reaches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Skip the current symbol and resume at the next symbol row.
    Recoverable,
    /// Abandon the current input stream.
    StreamFatal,
    /// Abandon the whole run.
    Fatal,
}

impl Error {
    pub fn header(message: impl Into<String>, location: &Location) -> Self {
        Error::Header {
            message: message.into(),
            location: location.clone(),
        }
    }

    pub fn symbol(message: impl Into<String>, location: &Location) -> Self {
        Error::Symbol {
            message: message.into(),
            location: location.clone(),
        }
    }

    pub fn pin(message: impl Into<String>, location: &Location) -> Self {
        Error::Pin {
            message: message.into(),
            location: location.clone(),
        }
    }

    pub fn validation(message: impl Into<String>, location: &Location) -> Self {
        Error::Validation {
            message: message.into(),
            location: location.clone(),
        }
    }

    pub fn logic(message: impl Into<String>, location: &Location) -> Self {
        Error::Logic {
            message: message.into(),
            location: location.clone(),
        }
    }

    pub fn row_source(message: impl Into<String>, location: &Location) -> Self {
        Error::Source {
            message: message.into(),
            location: location.clone(),
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Error::Header { location, .. }
            | Error::Symbol { location, .. }
            | Error::Pin { location, .. }
            | Error::Validation { location, .. }
            | Error::Logic { location, .. }
            | Error::Source { location, .. } => location,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Header { message, .. }
            | Error::Symbol { message, .. }
            | Error::Pin { message, .. }
            | Error::Validation { message, .. }
            | Error::Logic { message, .. }
            | Error::Source { message, .. } => message,
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Error::Symbol { .. } | Error::Pin { .. } | Error::Validation { .. } => {
                Severity::Recoverable
            }
            Error::Header { .. } | Error::Source { .. } => Severity::StreamFatal,
            Error::Logic { .. } => Severity::Fatal,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
