//! Process-wide `tracing` subscriber.

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

/// Quiets per-statement logging from the database driver.
const NOISY_CRATES: &str = ",sqlx=warn";

/// Builds the log filter: `RUST_LOG` when set, otherwise `log_level`.
///
/// An unparsable `log_level` falls back to `info`.
#[must_use]
pub fn env_filter(config: &AppConfig) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{}{NOISY_CRATES}", config.log_level)))
        .unwrap_or_else(|_| EnvFilter::new(format!("info{NOISY_CRATES}")))
}

/// Installs the global subscriber. JSON lines in production, compact text
/// elsewhere.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &AppConfig) -> anyhow::Result<()> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter(config));

    let result = if config.is_production() {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.with_target(false).compact().try_init()
    };
    result.map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
