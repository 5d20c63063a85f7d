//! Observability subsystem for the wager client
//!
//! Provides:
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//!
//! # Usage
//!
//! ```ignore
//! use wager_client::observability::{log_event, Event, Logger, Severity};
//!
//! let logger = Logger::stdout(Severity::Info).with_field("client_id", "1");
//! log_event(&logger, Severity::Info, Event::Connect, &[("result", "success")]);
//! ```

mod events;
mod logger;

pub use events::Event;
pub use logger::{Logger, MemorySink, Severity};

/// Log a typed event at the given severity
pub fn log_event(logger: &Logger, severity: Severity, event: Event, fields: &[(&str, &str)]) {
    logger.log(severity, event.as_str(), fields);
}

/// Log a typed event; failure events go out at ERROR, everything else at INFO
pub fn log_outcome(logger: &Logger, event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_failure() {
        Severity::Error
    } else {
        Severity::Info
    };
    logger.log(severity, event.as_str(), fields);
}
