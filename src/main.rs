//! wager-client entry point
//!
//! This is a minimal entrypoint that:
//! 1. Delegates argument parsing and dispatch to `cli::run`
//! 2. Prints errors to stderr
//! 3. Exits with non-zero on failure

use wager_client::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
