//! error.rs
//!
//! Error taxonomy for the synchronization engine.

use std::path::PathBuf;

use thiserror::Error;

/// A syntax error reported by the parser, with a 1-based location.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}, column {column}: {reason}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub reason: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, reason: impl Into<String>) -> Self {
        Self {
            line,
            column,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to parse source: {0}")]
    Parse(#[source] ParseError),

    #[error("failed to merge test suites: {0}")]
    Merge(#[source] ParseError),

    #[error("cache I/O error at {}: {source}", path.display())]
    CacheIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cache record at {} is corrupt: {source}", path.display())]
    CacheCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("test generation failed: {0}")]
    Generation(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SyncError {
    /// The parse failure behind this error, if any.
    pub fn parse_error(&self) -> Option<&ParseError> {
        match self {
            SyncError::Parse(e) | SyncError::Merge(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
