//! Wager records: the input file reader and the wire codec
//!
//! Records come from `agency-<id>.csv`, one per line, and leave the client
//! serialized as `|`-delimited fields joined by `;` within a batch.

mod errors;
mod reader;
mod record;

pub use errors::{ReaderError, ReaderResult, RecordError};
pub use reader::{RecordBatchReader, MAX_WINDOW};
pub use record::{
    serialize_batch, Batch, Record, FIELD_DELIMITER, INPUT_ARITY, INPUT_FIELD_SEPARATOR,
    RECORD_SEPARATOR,
};
