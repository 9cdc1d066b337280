//! Log subscriber setup.
//!
//! Logs go to stderr so that stdout stays clean for reports and JSON.

use tracing_subscriber::EnvFilter;

use crate::config::Settings;

/// Filter used when the configured directive does not parse.
const FALLBACK_FILTER: &str = "warn";

/// Builds the filter: `RUST_LOG` when set, otherwise the settings.
pub fn env_filter(settings: &Settings) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(settings.log_filter()))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER))
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init(settings: &Settings) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(settings))
        .with_writer(std::io::stderr)
        .with_target(settings.debug)
        .try_init();
}
