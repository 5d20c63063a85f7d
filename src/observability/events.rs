//! Observable events of the wager client
//!
//! Events are explicit and typed; the logger only ever sees their wire names.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Boot & lifecycle
    /// Configuration loaded and validated
    ConfigLoaded,
    /// Termination signal received
    ShutdownSignal,
    /// Shutdown performed
    Shutdown,

    // Transport
    /// Connection attempt to the service
    Connect,

    // Submission
    /// One batch framed, sent and acknowledged
    BatchSent,
    /// Input file exhausted
    EndOfInput,
    /// Input line skipped for having the wrong shape
    MalformedRecord,
    /// All batches submitted
    SubmissionComplete,
    /// Submission aborted
    SubmissionFailed,

    // Winner polling
    /// Winner query sent
    WinnersQuery,
    /// Service answered that the draw is not ready
    WinnersPending,
    /// Winner list received
    WinnersAnnounced,
    /// Polling aborted
    WinnersFailed,
}

impl Event {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "config_loaded",
            Event::ShutdownSignal => "shutdown_signal",
            Event::Shutdown => "shutdown",
            Event::Connect => "connect",
            Event::BatchSent => "batch_sent",
            Event::EndOfInput => "end_of_input",
            Event::MalformedRecord => "malformed_record",
            Event::SubmissionComplete => "submission_complete",
            Event::SubmissionFailed => "submission_failed",
            Event::WinnersQuery => "winners_query",
            Event::WinnersPending => "winners_pending",
            Event::WinnersAnnounced => "winners_announced",
            Event::WinnersFailed => "winners_failed",
        }
    }

    /// Returns true for events that end the client run with a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::SubmissionFailed | Event::WinnersFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_snake_case() {
        for event in [
            Event::ConfigLoaded,
            Event::Connect,
            Event::BatchSent,
            Event::WinnersAnnounced,
            Event::Shutdown,
        ] {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_lowercase() || c == '_'));
        }
    }

    #[test]
    fn test_failure_events() {
        assert!(Event::SubmissionFailed.is_failure());
        assert!(Event::WinnersFailed.is_failure());
        assert!(!Event::WinnersPending.is_failure());
    }
}
