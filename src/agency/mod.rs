//! Agency client: submission followed by winner polling
//!
//! [`Agency`] is the composition root. It owns the configuration, the
//! injected logger and the shared [`Lifecycle`], and runs the two phases in
//! order on the calling thread.

mod backoff;
mod errors;
mod poller;
mod submission;

pub use backoff::FixedBackoff;
pub use errors::{ClientError, ClientResult};
pub use poller::{
    winners_query, PollReport, PollState, WinnerPoller, WinnerResponse, PENDING_SENTINEL,
    WINNERS_QUERY, WINNER_SEPARATOR,
};
pub use submission::{Submission, SubmissionReport};

use crate::config::ClientConfig;
use crate::lifecycle::Lifecycle;
use crate::observability::{log_outcome, Event, Logger};

/// Result of a full client run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgencyReport {
    pub submission: SubmissionReport,
    pub poll: PollReport,
}

pub struct Agency {
    config: ClientConfig,
    lifecycle: Lifecycle,
    logger: Logger,
}

impl Agency {
    /// Every log line of this agency carries `client_id`.
    pub fn new(config: ClientConfig, logger: Logger) -> Self {
        let logger = logger.with_field("client_id", config.agency_id.as_str());
        let lifecycle = Lifecycle::new(logger.clone());
        Self {
            config,
            lifecycle,
            logger,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Shared with the signal listener
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }

    /// Submits the agency file.
    pub fn submit(&self) -> ClientResult<SubmissionReport> {
        let result = Submission::new(&self.config, &self.lifecycle, &self.logger).run();
        match &result {
            Ok(report) => log_outcome(
                &self.logger,
                Event::SubmissionComplete,
                &[
                    ("batches", &report.batches_sent.to_string()),
                    ("records", &report.records_sent.to_string()),
                    ("result", "success"),
                ],
            ),
            Err(e) => self.log_failure(Event::SubmissionFailed, e),
        }
        result
    }

    /// Polls for this agency's winners.
    pub fn poll_winners(&self) -> ClientResult<PollReport> {
        let result = WinnerPoller::new(&self.config, &self.lifecycle, &self.logger).run();
        if let Err(e) = &result {
            self.log_failure(Event::WinnersFailed, e);
        }
        result
    }

    /// Submission, then polling. A failed submission skips polling.
    ///
    /// Shutdown is performed on every exit path; it is a no-op if the signal
    /// listener got there first.
    pub fn run(&self) -> ClientResult<AgencyReport> {
        let result = self.submit().and_then(|submission| {
            self.poll_winners()
                .map(|poll| AgencyReport { submission, poll })
        });
        self.lifecycle.shutdown();
        result
    }

    fn log_failure(&self, event: Event, error: &ClientError) {
        let result = if error.is_cancelled() {
            "cancelled"
        } else {
            "fail"
        };
        log_outcome(
            &self.logger,
            event,
            &[
                ("code", error.code()),
                ("error", &error.to_string()),
                ("result", result),
            ],
        );
    }
}
