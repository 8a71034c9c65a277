//! Log output for the binary.
//!
//! Library code only emits `tracing` events; the binary installs a
//! `tracing-subscriber` formatter on stderr so stdout stays free for tables
//! and messages.

use tracing_subscriber::EnvFilter;

use crate::{Error, Result};

/// Filter used when `RUST_LOG` is unset, by number of `-v` flags.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "catto=warn",
        1 => "catto=info",
        2 => "catto=debug",
        _ => "catto=trace",
    }
}

pub fn env_filter(verbosity: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)))
}

/// Install the global subscriber. Fails if one is already set.
pub fn init_tracing(verbosity: u8) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(verbosity))
        .with_writer(std::io::stderr)
        .with_target(verbosity > 1)
        .try_init()
        .map_err(|e| Error::Config(format!("could not install log subscriber: {}", e)))
}
