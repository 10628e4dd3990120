#![forbid(unsafe_code)]

use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "YTLEARN_LOG";
pub const DEFAULT_DIRECTIVE: &str = "warn";

pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Logs go to stderr so stdout stays parseable.
pub fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
