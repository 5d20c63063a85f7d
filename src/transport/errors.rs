//! Transport error types
//!
//! Error codes:
//! - CLIENT_CONNECT_FAILED
//! - CLIENT_PROTOCOL_ERROR
//! - CLIENT_PEER_CLOSED
//! - CLIENT_IO_ERROR
//! - CLIENT_PAYLOAD_TOO_LARGE

use std::io;

use thiserror::Error;

/// Transport failures. None of them are retried inside the transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection closed by peer after {received} of {expected} bytes")]
    ConnectionClosedByPeer { expected: usize, received: usize },

    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("payload of {0} bytes does not fit a frame")]
    PayloadTooLarge(usize),
}

impl TransportError {
    pub(crate) fn io(operation: &'static str, source: io::Error) -> Self {
        TransportError::Io { operation, source }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            TransportError::Connect { .. } => "CLIENT_CONNECT_FAILED",
            TransportError::Protocol(_) => "CLIENT_PROTOCOL_ERROR",
            TransportError::ConnectionClosedByPeer { .. } => "CLIENT_PEER_CLOSED",
            TransportError::Io { .. } => "CLIENT_IO_ERROR",
            TransportError::PayloadTooLarge(_) => "CLIENT_PAYLOAD_TOO_LARGE",
        }
    }

    /// True for failures of an exchange with the peer; callers treat a peer
    /// close the same way as a malformed or missing reply.
    pub fn is_protocol_failure(&self) -> bool {
        matches!(
            self,
            TransportError::Protocol(_) | TransportError::ConnectionClosedByPeer { .. }
        )
    }
}

/// Result type for transport operations
pub type TransportResult<T> = Result<T, TransportError>;
