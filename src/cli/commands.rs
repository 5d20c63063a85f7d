//! CLI command implementations
//!
//! Boot order:
//! 1. Resolve configuration (file, then CLI/env overrides)
//! 2. Build the logger at the configured level
//! 3. Build the agency and install the termination-signal listener
//! 4. Run the requested phase(s)
//!
//! A run stopped by a termination signal is a clean exit.

use super::args::{Cli, Command};
use crate::agency::{Agency, ClientError, ClientResult};
use crate::config::ClientConfig;
use crate::observability::{log_event, Event, Logger, Severity};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
/// This is the only function that main.rs should call.
pub fn run() -> ClientResult<()> {
    let cli = Cli::parse_args();
    run_command(cli.command)
}

/// Resolve configuration, install the signal listener, run the command
pub fn run_command(cmd: Command) -> ClientResult<()> {
    let args = cmd.args();
    let config = ClientConfig::resolve(args.config.as_deref(), &args.overrides())?;
    let logger = Logger::stdout(config.log_level);

    let agency = Agency::new(config, logger);
    agency
        .lifecycle()
        .install_signal_handler()
        .map_err(ClientError::SignalHandler)?;

    execute(&cmd, &agency)
}

/// Run `cmd` on an already built agency
pub fn execute(cmd: &Command, agency: &Agency) -> ClientResult<()> {
    let config = agency.config();
    log_event(
        agency.logger(),
        Severity::Info,
        Event::ConfigLoaded,
        &[
            ("batch_byte_size", &config.batch_byte_size.to_string()),
            ("poll_interval_ms", &config.poll_interval_ms.to_string()),
            ("server_address", &config.server_address),
        ],
    );

    let result = match cmd {
        Command::Run(_) => agency.run().map(|_| ()),
        Command::Submit(_) => agency.submit().map(|_| ()),
        Command::Winners(_) => agency.poll_winners().map(|_| ()),
    };
    agency.lifecycle().shutdown();

    match result {
        Err(e) if e.is_cancelled() => Ok(()),
        other => other,
    }
}
