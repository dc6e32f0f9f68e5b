//! Diagnostic logging setup.
//!
//! Diagnostics go to stderr through `tracing`; command results are printed to
//! stdout by the command handlers.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Filter directive for a `-v` count when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "repokit=warn",
        1 => "repokit=info",
        2 => "repokit=debug",
        _ => "repokit=trace",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the verbosity flag. Calling this twice is harmless;
/// the second call reports an error that callers may ignore.
pub fn init(verbosity: u8) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_level(true)
        .compact();

    let filter_layer = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbosity)))?;

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}
