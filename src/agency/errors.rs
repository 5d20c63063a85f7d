//! Client-level error type
//!
//! Every loop owner (submission, polling) returns `ClientError`; the CLI maps
//! it to an exit status.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::lifecycle::LifecycleError;
use crate::transport::TransportError;
use crate::wager::ReaderError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Reader(#[from] ReaderError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("failed to install signal handler: {0}")]
    SignalHandler(#[source] io::Error),

    #[error("shutdown requested")]
    Cancelled,
}

impl From<LifecycleError> for ClientError {
    fn from(e: LifecycleError) -> Self {
        match e {
            LifecycleError::Cancelled => ClientError::Cancelled,
            LifecycleError::Transport(inner) => ClientError::Transport(inner),
        }
    }
}

impl ClientError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            ClientError::Config(e) => e.code(),
            ClientError::Reader(e) => e.code(),
            ClientError::Transport(e) => e.code(),
            ClientError::SignalHandler(_) => "CLIENT_SIGNAL_HANDLER_FAILED",
            ClientError::Cancelled => "CLIENT_CANCELLED",
        }
    }

    /// Whether the error is the result of a requested shutdown
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_pass_through() {
        let err: ClientError = TransportError::Protocol("bad".into()).into();
        assert_eq!(err.code(), "CLIENT_PROTOCOL_ERROR");

        let err: ClientError = ConfigError::new("missing").into();
        assert_eq!(err.code(), "CLIENT_CONFIG_ERROR");
        assert_eq!(err.to_string(), "missing");
    }

    #[test]
    fn test_lifecycle_cancel_maps_to_cancelled() {
        let err: ClientError = LifecycleError::Cancelled.into();
        assert!(err.is_cancelled());
        assert_eq!(err.code(), "CLIENT_CANCELLED");
    }
}
