//! Winner poller
//!
//! ```text
//!            pending                 interval elapsed
//! Querying ----------> Waiting ------------------------> Querying
//!    |  \
//!    |   \ winner list
//!    |    `-----------> Resolved
//!    | transport error / shutdown
//!    `----------------> Failed
//! ```
//!
//! Each query uses a brand-new session. "Pending" is retried forever at a
//! fixed interval; a transport error is final.

use super::backoff::FixedBackoff;
use super::errors::{ClientError, ClientResult};
use crate::config::ClientConfig;
use crate::lifecycle::Lifecycle;
use crate::observability::{log_event, Event, Logger, Severity};
use crate::transport::{
    receive_frame, send_confirmation, send_frame, Session, TransportError, TransportResult,
};

/// Payload the service sends while the draw is not ready
pub const PENDING_SENTINEL: &str = "waiting";

/// First field of the winner query
pub const WINNERS_QUERY: &str = "winners";

/// Separates winner ids in a response, and the query's fields
pub const WINNER_SEPARATOR: char = ',';

/// Interpreted winner response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinnerResponse {
    /// Draw not computed yet
    Pending,
    /// Document ids of the agency's winners, possibly none
    Winners(Vec<String>),
}

impl WinnerResponse {
    /// Interprets a response payload.
    ///
    /// An empty payload means zero winners.
    pub fn parse(payload: &[u8]) -> TransportResult<Self> {
        let text = std::str::from_utf8(payload).map_err(|e| {
            TransportError::Protocol(format!("winner response is not UTF-8: {}", e))
        })?;

        if text == PENDING_SENTINEL {
            return Ok(WinnerResponse::Pending);
        }
        if text.is_empty() {
            return Ok(WinnerResponse::Winners(Vec::new()));
        }
        Ok(WinnerResponse::Winners(
            text.split(WINNER_SEPARATOR).map(str::to_string).collect(),
        ))
    }
}

/// Winner query payload for an agency
pub fn winners_query(agency_id: &str) -> String {
    format!("{}{}{}", WINNERS_QUERY, WINNER_SEPARATOR, agency_id)
}

/// Poller states
#[derive(Debug)]
pub enum PollState {
    Querying,
    Waiting,
    Resolved(Vec<String>),
    Failed(ClientError),
}

impl PollState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PollState::Resolved(_) | PollState::Failed(_))
    }
}

/// Outcome of a resolved poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollReport {
    pub winners: Vec<String>,
    /// Queries sent, including the final one
    pub attempts: u32,
}

pub struct WinnerPoller<'a> {
    config: &'a ClientConfig,
    lifecycle: &'a Lifecycle,
    logger: &'a Logger,
    backoff: FixedBackoff,
    attempts: u32,
}

impl<'a> WinnerPoller<'a> {
    pub fn new(config: &'a ClientConfig, lifecycle: &'a Lifecycle, logger: &'a Logger) -> Self {
        Self {
            config,
            lifecycle,
            logger,
            backoff: FixedBackoff::new(config.poll_interval()),
            attempts: 0,
        }
    }

    /// Polls until the winners are known, a transport error occurs, or
    /// shutdown is requested.
    pub fn run(&mut self) -> ClientResult<PollReport> {
        let mut state = PollState::Querying;
        loop {
            state = match self.step(state) {
                PollState::Resolved(winners) => return Ok(self.resolve(winners)),
                PollState::Failed(_) if self.lifecycle.is_shutdown() => {
                    return Err(ClientError::Cancelled)
                }
                PollState::Failed(e) => return Err(e),
                next => next,
            };
        }
    }

    fn resolve(&self, winners: Vec<String>) -> PollReport {
        log_event(
            self.logger,
            Severity::Info,
            Event::WinnersAnnounced,
            &[
                ("attempts", &self.attempts.to_string()),
                ("result", "success"),
                ("winners", &winners.len().to_string()),
            ],
        );
        PollReport {
            winners,
            attempts: self.attempts,
        }
    }

    /// Performs one transition.
    pub fn step(&mut self, state: PollState) -> PollState {
        match state {
            PollState::Querying => {
                if self.lifecycle.is_shutdown() {
                    return PollState::Failed(ClientError::Cancelled);
                }
                self.attempts += 1;
                match self.query() {
                    Ok(WinnerResponse::Pending) => {
                        log_event(
                            self.logger,
                            Severity::Info,
                            Event::WinnersPending,
                            &[("attempt", &self.attempts.to_string())],
                        );
                        PollState::Waiting
                    }
                    Ok(WinnerResponse::Winners(winners)) => PollState::Resolved(winners),
                    Err(e) => PollState::Failed(e),
                }
            }
            PollState::Waiting => {
                if self.backoff.wait(self.lifecycle) {
                    PollState::Failed(ClientError::Cancelled)
                } else {
                    PollState::Querying
                }
            }
            terminal => terminal,
        }
    }

    /// One query over a fresh session, closed before returning.
    fn query(&self) -> ClientResult<WinnerResponse> {
        let mut session = Session::establish(&self.config.server_address, self.logger)?;
        self.lifecycle.register(&mut session)?;

        let result = self.exchange(&mut session);

        self.lifecycle.clear(session.id());
        session.close();
        result
    }

    fn exchange(&self, session: &mut Session) -> ClientResult<WinnerResponse> {
        let query = winners_query(&self.config.agency_id);
        log_event(
            self.logger,
            Severity::Trace,
            Event::WinnersQuery,
            &[("session_id", &session.id().to_string())],
        );

        send_frame(session, query.as_bytes())?;
        let payload = receive_frame(session)?;
        send_confirmation(session)?;
        Ok(WinnerResponse::parse(&payload)?)
    }
}
