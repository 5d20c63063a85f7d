//! wager-client - submits an agency's wagers to the aggregation service and
//! polls it for the winners
//!
//! Layers, leaves first:
//! - `wager`: record codec and chunk-bounded file reader
//! - `transport`: sessions, length-prefixed framing, confirmation handshake
//! - `lifecycle`: signal-driven, idempotent shutdown
//! - `agency`: submission coordinator and winner poller
//! - `config`, `observability`, `cli`: collaborators

pub mod agency;
pub mod cli;
pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod transport;
pub mod wager;
