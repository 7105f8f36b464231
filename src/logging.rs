//! Diagnostic logging via tracing-subscriber.
//!
//! Logs go to stderr so stdout stays clean for `current` and `completions`.
//! `CLAUDESWAP_LOG` takes precedence over the `-v`/`-q` flags.

use anyhow::{Result, anyhow};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CLAUDESWAP_LOG";

/// Map `-q` / `-v` counts to a filter directive
pub fn level_for(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Build the filter: `CLAUDESWAP_LOG` when set and parseable, else `level`
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .or_else(|_| EnvFilter::try_new(level))
            .map_err(|e| anyhow!("invalid log filter '{directives}': {e}")),
        _ => EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level '{level}': {e}")),
    }
}

/// Initialise the global subscriber once at startup
pub fn init(verbose: u8, quiet: bool) -> Result<()> {
    let filter = build_filter(level_for(verbose, quiet))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init()
        .map_err(|e| anyhow!("failed to set subscriber: {e}"))
}
