//! CLI module for the wager client
//!
//! Provides command-line interface for:
//! - run: submit the agency file, then poll for winners
//! - submit: submit the agency file only
//! - winners: poll for winners only

mod args;
mod commands;

pub use args::{Cli, ClientArgs, Command};
pub use commands::{execute, run, run_command};
