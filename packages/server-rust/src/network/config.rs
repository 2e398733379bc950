//! HTTP listener configuration.

use std::time::Duration;

use clap::Args;

/// Settings for the HTTP listener that carries the RPC and event endpoints.
#[derive(Debug, Clone, Args)]
pub struct NetworkConfig {
    /// Bind address for the server.
    #[arg(id = "http_host", long = "http-host", env = "HTTP_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on. 0 means OS-assigned.
    #[arg(id = "http_port", long = "http-port", env = "HTTP_PORT", default_value_t = 9090)]
    pub port: u16,

    /// Allowed CORS origins (comma-separated, `*` for any).
    #[arg(long = "cors-origins", env = "CORS_ORIGINS", value_delimiter = ',', default_value = "*")]
    pub cors_origins: Vec<String>,

    /// Maximum time to wait for a request to complete, in milliseconds.
    /// Must exceed the service's `context-timeout-ms`.
    #[arg(long = "request-timeout-ms", env = "REQUEST_TIMEOUT_MS", default_value_t = 35_000)]
    pub request_timeout_ms: u64,

    /// Maximum accepted request body size in bytes.
    #[arg(long = "max-body-bytes", env = "MAX_BODY_BYTES", default_value_t = 1_048_576)]
    pub max_body_bytes: usize,
}

impl NetworkConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 9090,
            cors_origins: vec!["*".to_string()],
            request_timeout_ms: 35_000,
            max_body_bytes: 1_048_576, // 1 MB
        }
    }
}
