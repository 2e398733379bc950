//! Process configuration.
//!
//! [`AppConfig`] is parsed once at startup from command-line flags with
//! environment-variable fallbacks, then handed by reference to each component
//! constructor. Nothing reads configuration ambiently after that.

use clap::{Args, ValueEnum};

use crate::network::NetworkConfig;
use crate::service::ServiceConfig;

/// Top-level configuration shared by the `serve` and `consumer` commands.
#[derive(Debug, Clone, Args)]
pub struct AppConfig {
    /// Application name, attached to log output.
    #[arg(long, env = "APP", default_value = "job_service")]
    pub app: String,

    /// Deployment environment. `production` switches logs to JSON.
    #[arg(long, env = "ENVIRONMENT", default_value = "develop")]
    pub environment: String,

    /// Log filter directive (e.g. `info`, `debug,sqlx=warn`).
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, env = "LOG_LEVEL", default_value = "debug")]
    pub log_level: String,

    #[command(flatten)]
    pub network: NetworkConfig,

    #[command(flatten)]
    pub service: ServiceConfig,

    #[command(flatten)]
    pub database: DatabaseConfig,

    #[command(flatten)]
    pub broker: BrokerConfig,
}

impl AppConfig {
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }

    /// Rejects settings that cannot work together.
    ///
    /// The HTTP request timeout must outlast the service timeout, otherwise
    /// a slow storage call surfaces as a bare 408 instead of a
    /// `DEADLINE_EXCEEDED` status.
    ///
    /// # Errors
    ///
    /// Describes the first conflicting pair of settings.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.network.request_timeout_ms <= self.service.context_timeout_ms {
            anyhow::bail!(
                "request-timeout-ms ({}) must be greater than context-timeout-ms ({})",
                self.network.request_timeout_ms,
                self.service.context_timeout_ms
            );
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: "job_service".to_string(),
            environment: "develop".to_string(),
            log_level: "debug".to_string(),
            network: NetworkConfig::default(),
            service: ServiceConfig::default(),
            database: DatabaseConfig::default(),
            broker: BrokerConfig::default(),
        }
    }
}

/// Which repository implementation backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StorageBackend {
    #[default]
    Postgres,
    /// Process-local storage; contents are lost on exit.
    Memory,
}

/// Relational store connection settings.
#[derive(Debug, Clone, Args)]
pub struct DatabaseConfig {
    #[arg(long = "storage-backend", env = "STORAGE_BACKEND", value_enum, default_value_t = StorageBackend::Postgres)]
    pub backend: StorageBackend,

    /// Full connection URL. Overrides the individual `POSTGRES_*` settings.
    #[arg(long = "database-url", env = "DATABASE_URL", hide_env_values = true)]
    pub url: Option<String>,

    #[arg(id = "db_host", long = "db-host", env = "POSTGRES_HOST", default_value = "localhost")]
    pub host: String,

    #[arg(id = "db_port", long = "db-port", env = "POSTGRES_PORT", default_value_t = 5432)]
    pub port: u16,

    #[arg(long = "db-user", env = "POSTGRES_USER", default_value = "postgres")]
    pub user: String,

    #[arg(long = "db-password", env = "POSTGRES_PASSWORD", default_value = "", hide_env_values = true)]
    pub password: String,

    #[arg(long = "db-name", env = "POSTGRES_DATABASE", default_value = "job_service")]
    pub name: String,

    #[arg(long = "db-sslmode", env = "POSTGRES_SSLMODE", default_value = "disable")]
    pub ssl_mode: String,

    #[arg(long = "db-max-connections", env = "DB_MAX_CONNECTIONS", default_value_t = 10)]
    pub max_connections: u32,

    /// Create the `jobs` table at startup if it does not exist.
    #[arg(long = "db-init-schema", env = "DB_INIT_SCHEMA")]
    pub init_schema: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Postgres,
            url: None,
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            name: "job_service".to_string(),
            ssl_mode: "disable".to_string(),
            max_connections: 10,
            init_schema: false,
        }
    }
}

/// Message broker settings for the ingestion pipeline.
#[derive(Debug, Clone, Args)]
pub struct BrokerConfig {
    /// Comma-separated broker addresses.
    #[arg(long = "kafka-address", env = "KAFKA_ADDRESS", value_delimiter = ',', default_value = "localhost:9092")]
    pub addresses: Vec<String>,

    /// Topic carrying job-creation events.
    #[arg(long = "job-topic", env = "KAFKA_TOPIC_JOB_SERVICE", default_value = "job.service.create")]
    pub job_topic: String,

    #[arg(long = "group-id", env = "KAFKA_GROUP_ID", default_value = "1")]
    pub group_id: String,

    /// Bounded capacity of the in-process delivery channel.
    #[arg(long = "broker-capacity", env = "BROKER_CHANNEL_CAPACITY", default_value_t = 256)]
    pub channel_capacity: usize,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            addresses: vec!["localhost:9092".to_string()],
            job_topic: "job.service.create".to_string(),
            group_id: "1".to_string(),
            channel_capacity: 256,
        }
    }
}
