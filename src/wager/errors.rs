//! Record and batch-reader error types
//!
//! Error codes:
//! - CLIENT_MALFORMED_RECORD (skipped by the reader, never fatal)
//! - CLIENT_INPUT_OPEN_FAILED
//! - CLIENT_INPUT_IO_ERROR
//! - CLIENT_INVALID_WINDOW

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A line or field that cannot become a [`Record`](super::Record)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("expected {expected} fields, found {found}")]
    FieldCount { expected: usize, found: usize },

    #[error("field '{field}' contains reserved character {character:?}")]
    ReservedCharacter { field: &'static str, character: char },
}

impl RecordError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        "CLIENT_MALFORMED_RECORD"
    }
}

/// Failures of the batch reader
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to open input file {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("input read failed at byte offset {offset}: {source}")]
    Io {
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("batch window must be at least one byte")]
    InvalidWindow,
}

impl ReaderError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ReaderError::Open { .. } => "CLIENT_INPUT_OPEN_FAILED",
            ReaderError::Io { .. } => "CLIENT_INPUT_IO_ERROR",
            ReaderError::InvalidWindow => "CLIENT_INVALID_WINDOW",
        }
    }
}

/// Result type for batch reader operations
pub type ReaderResult<T> = Result<T, ReaderError>;
