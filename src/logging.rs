//! Logging configuration for db-stmt.
//!
//! Logs go to stderr so that rendered results on stdout stay clean.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence over `default_level`.
pub fn init_stderr_logging(default_level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(default_level))
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the filter from `RUST_LOG`, falling back to `default_level`, then `info`.
pub fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
