//! repokit: keep a private line of development out of public history.
//!
//! This is the main entry point for the `repokit` CLI. It parses arguments,
//! sets up logging, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes.

use repokit::cli::Cli;
use repokit::error::RepokitError;
use repokit::{commands, exit_codes, logging};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    let cwd = match cli.directory {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().map_err(|e| {
            RepokitError::UserError(format!("failed to get current working directory: {}", e))
        }),
    };

    match cwd.and_then(|cwd| commands::dispatch(cli.command, &cwd)) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            ExitCode::from(err.exit_code() as u8)
        }
    }
}
