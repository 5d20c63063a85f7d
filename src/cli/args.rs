//! CLI argument definitions using clap
//!
//! Commands:
//! - wager-client run     [options]
//! - wager-client submit  [options]
//! - wager-client winners [options]
//!
//! Every option can also come from the matching `CLI_*` environment variable.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;
use crate::observability::Severity;

/// wager-client - submits agency wagers and asks for the winners
#[derive(Parser, Debug)]
#[command(name = "wager-client")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit the agency file, then poll for winners
    Run(ClientArgs),

    /// Submit the agency file only
    Submit(ClientArgs),

    /// Poll for winners only
    Winners(ClientArgs),
}

impl Command {
    pub fn args(&self) -> &ClientArgs {
        match self {
            Command::Run(args) | Command::Submit(args) | Command::Winners(args) => args,
        }
    }
}

/// Options shared by every command
#[derive(Args, Debug, Clone, Default)]
pub struct ClientArgs {
    /// Path to a JSON configuration file
    #[arg(long, env = "CLI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Agency identifier
    #[arg(long, env = "CLI_ID")]
    pub agency_id: Option<String>,

    /// Service address (host:port)
    #[arg(long, env = "CLI_SERVER_ADDRESS")]
    pub server_address: Option<String>,

    /// Input window per batch, in bytes
    #[arg(long, env = "CLI_BATCH_BYTE_SIZE")]
    pub batch_byte_size: Option<u64>,

    /// Delay between winner queries, in milliseconds
    #[arg(long, env = "CLI_POLL_INTERVAL_MS")]
    pub poll_interval_ms: Option<u64>,

    /// Directory holding agency-<id>.csv
    #[arg(long, env = "CLI_DATASET_DIR")]
    pub dataset_dir: Option<PathBuf>,

    /// Minimum log severity (trace, info, warn, error, critical)
    #[arg(long, env = "CLI_LOG_LEVEL")]
    pub log_level: Option<Severity>,
}

impl ClientArgs {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            agency_id: self.agency_id.clone(),
            server_address: self.server_address.clone(),
            batch_byte_size: self.batch_byte_size,
            poll_interval_ms: self.poll_interval_ms,
            dataset_dir: self.dataset_dir.clone(),
            log_level: self.log_level,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
