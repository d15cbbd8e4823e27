//! Logging setup
//!
//! Everything goes to stderr: stdout carries command output and, for the MCP
//! server, the protocol stream.

use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset, from the number of `-v` flags
pub fn default_level(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global fmt subscriber. `RUST_LOG` takes precedence over `verbosity`.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbosity)));

    // A subscriber may already be installed (tests, embedding callers)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
