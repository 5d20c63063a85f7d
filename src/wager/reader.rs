//! Chunk-bounded record reader
//!
//! Reads the input file in windows of at most `max_bytes`, never splitting a
//! record across two batches:
//! - a window that ends mid-line is cut at its last `\n` and the file offset
//!   is rewound by the length of the cut fragment
//! - a window with no `\n` at all is widened by another `max_bytes` until a
//!   line break or the end of the file is reached
//! - at the end of the file an unterminated tail is the final record
//!
//! Lines with the wrong shape are logged and skipped; they never abort the
//! surrounding batch.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use super::errors::{ReaderError, ReaderResult};
use super::record::{Batch, Record};
use crate::observability::{log_event, Event, Logger, Severity};

const LINE_DELIMITER: u8 = b'\n';

/// Largest accepted window; a batch longer than this could never be framed
pub const MAX_WINDOW: usize = u32::MAX as usize;

/// Bytes requested from the source per read call
const READ_CHUNK: usize = 64 * 1024;

/// Reads batches of records from a delimited file.
pub struct RecordBatchReader<R = File> {
    /// Input source
    source: R,
    /// Agency stamped on every record
    agency: String,
    /// Window size in bytes
    max_bytes: usize,
    /// Current byte offset in the source
    offset: u64,
    /// Owned read buffer, reused across calls
    window: Vec<u8>,
    logger: Logger,
}

impl RecordBatchReader<File> {
    /// Opens the input file for reading.
    ///
    /// # Errors
    ///
    /// Returns `ReaderError::Open` if the file cannot be opened and
    /// `ReaderError::InvalidWindow` if `max_bytes` is zero or above
    /// [`MAX_WINDOW`].
    pub fn open(
        path: &Path,
        agency: impl Into<String>,
        max_bytes: usize,
        logger: Logger,
    ) -> ReaderResult<Self> {
        let file = File::open(path).map_err(|source| ReaderError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_source(file, agency, max_bytes, logger)
    }

    /// Path of the input file of an agency inside `dataset_dir`
    pub fn agency_file(dataset_dir: &Path, agency: &str) -> PathBuf {
        dataset_dir.join(format!("agency-{}.csv", agency))
    }
}

impl<R: Read + Seek> RecordBatchReader<R> {
    /// Wraps an already open source positioned at offset zero.
    pub fn from_source(
        source: R,
        agency: impl Into<String>,
        max_bytes: usize,
        logger: Logger,
    ) -> ReaderResult<Self> {
        if max_bytes == 0 || max_bytes > MAX_WINDOW {
            return Err(ReaderError::InvalidWindow);
        }
        Ok(Self {
            source,
            agency: agency.into(),
            max_bytes,
            offset: 0,
            window: Vec::new(),
            logger,
        })
    }

    /// Returns the current byte offset in the source.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Reads the next batch.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(batch))` with every well-formed record of the window
    /// - `Ok(None)` once the source is exhausted
    /// - `Err(ReaderError::Io)` on a read or seek failure
    pub fn next_batch(&mut self) -> ReaderResult<Option<Batch>> {
        self.window.clear();
        let window_start = self.offset;

        let complete_len = loop {
            let requested = self.max_bytes;
            let exhausted = self.fill(requested)? < requested;

            if exhausted {
                // A short final read may leave zero padding behind the data
                while self.window.last() == Some(&0) {
                    self.window.pop();
                }
                if self.window.is_empty() {
                    return Ok(None);
                }
                break self.window.len();
            }

            if self.window.last() == Some(&LINE_DELIMITER) {
                break self.window.len();
            }

            match self.window.iter().rposition(|b| *b == LINE_DELIMITER) {
                Some(pos) => {
                    let fragment = self.window.len() - pos - 1;
                    self.rewind(fragment)?;
                    break pos + 1;
                }
                // Record longer than the window: widen it
                None => continue,
            }
        };

        Ok(Some(self.parse_window(window_start, complete_len)))
    }

    /// Appends up to `requested` bytes to the window, accumulating short
    /// reads. Returns fewer than `requested` only at end of input.
    ///
    /// The window grows by at most `READ_CHUNK` per read, so memory follows
    /// the data actually read rather than the configured window.
    fn fill(&mut self, requested: usize) -> ReaderResult<usize> {
        let start = self.window.len();
        let mut filled = 0;

        while filled < requested {
            let end = start + filled;
            let chunk = (requested - filled).min(READ_CHUNK);
            self.window.resize(end + chunk, 0);

            let result = self.source.read(&mut self.window[end..]);
            let read = result.as_ref().map_or(0, |n| *n);
            self.window.truncate(end + read);
            match result {
                Ok(0) => break,
                Ok(n) => {
                    filled += n;
                    self.offset += n as u64;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(source) => {
                    return Err(ReaderError::Io {
                        offset: self.offset,
                        source,
                    });
                }
            }
        }

        Ok(filled)
    }

    /// Moves the source back by `len` bytes so the next call re-reads them.
    fn rewind(&mut self, len: usize) -> ReaderResult<()> {
        if len == 0 {
            return Ok(());
        }
        self.source
            .seek(SeekFrom::Current(-(len as i64)))
            .map_err(|source| ReaderError::Io {
                offset: self.offset,
                source,
            })?;
        self.offset -= len as u64;
        self.window.truncate(self.window.len() - len);
        Ok(())
    }

    fn parse_window(&self, window_start: u64, len: usize) -> Batch {
        let mut batch = Vec::new();
        let mut line_offset = window_start;

        for raw in self.window[..len].split(|b| *b == LINE_DELIMITER) {
            let this_offset = line_offset;
            line_offset += raw.len() as u64 + 1;

            let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
            let line = String::from_utf8_lossy(raw);
            if line.trim().is_empty() {
                continue;
            }

            match Record::from_line(&self.agency, &line) {
                Ok(record) => batch.push(record),
                Err(e) => log_event(
                    &self.logger,
                    Severity::Warn,
                    Event::MalformedRecord,
                    &[
                        ("code", e.code()),
                        ("error", &e.to_string()),
                        ("offset", &this_offset.to_string()),
                        ("result", "skipped"),
                    ],
                ),
            }
        }

        batch
    }
}
