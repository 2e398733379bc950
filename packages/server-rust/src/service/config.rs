use std::time::Duration;

use clap::Args;

/// Domain service configuration.
#[derive(Debug, Clone, Args)]
pub struct ServiceConfig {
    /// Upper bound for every storage call made by the domain service, in
    /// milliseconds. Independent of any caller-supplied deadline.
    #[arg(long = "context-timeout-ms", env = "CONTEXT_TIMEOUT_MS", default_value_t = 30_000)]
    pub context_timeout_ms: u64,
}

impl ServiceConfig {
    #[must_use]
    pub fn context_timeout(&self) -> Duration {
        Duration::from_millis(self.context_timeout_ms)
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            context_timeout_ms: 30_000,
        }
    }
}
