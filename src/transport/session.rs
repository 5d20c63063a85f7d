//! TCP sessions with the aggregation service
//!
//! A session is one connection attempt. It is owned by the component that
//! established it, never reused across retries, and closed exactly once:
//! explicitly via [`Session::close`] or on drop.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use uuid::Uuid;

use super::errors::{TransportError, TransportResult};
use crate::observability::{log_event, Event, Logger, Severity};

/// An open connection to the service.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    stream: TcpStream,
    closed: bool,
}

impl Session {
    /// Opens one connection to `address`.
    ///
    /// Failure is final for this attempt; retrying is the caller's policy.
    pub fn establish(address: &str, logger: &Logger) -> TransportResult<Self> {
        match TcpStream::connect(address) {
            Ok(stream) => {
                let id = Uuid::new_v4();
                log_event(
                    logger,
                    Severity::Info,
                    Event::Connect,
                    &[
                        ("address", address),
                        ("result", "success"),
                        ("session_id", &id.to_string()),
                    ],
                );
                Ok(Self {
                    id,
                    stream,
                    closed: false,
                })
            }
            Err(source) => {
                log_event(
                    logger,
                    Severity::Critical,
                    Event::Connect,
                    &[
                        ("address", address),
                        ("error", &source.to_string()),
                        ("result", "fail"),
                    ],
                );
                Err(TransportError::Connect {
                    address: address.to_string(),
                    source,
                })
            }
        }
    }

    /// Session id used to correlate log lines
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Returns a handle another thread can use to shut this session down.
    pub fn handle(&self) -> TransportResult<SessionHandle> {
        let stream = self
            .stream
            .try_clone()
            .map_err(|e| TransportError::io("clone session handle", e))?;
        Ok(SessionHandle {
            session_id: self.id,
            stream,
        })
    }

    /// Whether [`close`](Self::close) already ran
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Shuts the connection down. Later calls are no-ops.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        // The peer or a shutdown handle may have closed it already
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Read for Session {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for Session {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Cross-thread handle to a session's socket.
///
/// Shutting the socket down unblocks any read or write the owning thread is
/// parked in; the owner then observes an error or a zero-byte read.
#[derive(Debug)]
pub struct SessionHandle {
    session_id: Uuid,
    stream: TcpStream,
}

impl SessionHandle {
    /// Id of the session this handle belongs to
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Shuts down both directions of the socket.
    ///
    /// An already disconnected socket is not an error.
    pub fn shutdown(&self) -> io::Result<()> {
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}
