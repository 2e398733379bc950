//! Process wiring.
//!
//! [`App::new`] builds every component from an [`AppConfig`]; [`App::run`]
//! drives them until the shutdown future resolves and then tears them down in
//! order: stop accepting HTTP calls, close the broker, close storage.

use std::future::Future;
use std::sync::Arc;

use tracing::{error, info};

use crate::config::{AppConfig, StorageBackend};
use crate::ingest::{consumer_config, BrokerConsumer, MemoryBroker, JOB_CREATE_CONSUMER};
use crate::network::NetworkModule;
use crate::rpc::JobRpc;
use crate::service::{JobService, JobUseCase};
use crate::storage::{InMemoryJobRepository, JobRepository, PgJobRepository};

/// What the process serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Job RPC endpoints plus the job-creation consumer.
    Server,
    /// Only the named consumer (and its event endpoint).
    Consumer(String),
}

impl RunMode {
    fn consumer_name(&self) -> &str {
        match self {
            Self::Server => JOB_CREATE_CONSUMER,
            Self::Consumer(name) => name,
        }
    }
}

/// Fully constructed application components.
pub struct App {
    config: AppConfig,
    repo: Arc<dyn JobRepository>,
    service: Arc<dyn JobService>,
    broker: Arc<MemoryBroker>,
}

impl App {
    /// Opens storage and builds the service and broker.
    ///
    /// # Errors
    ///
    /// Fails on inconsistent settings, when the database cannot be reached,
    /// or when schema bootstrap fails.
    pub async fn new(config: AppConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let repo: Arc<dyn JobRepository> = match config.database.backend {
            StorageBackend::Postgres => Arc::new(PgJobRepository::connect(&config.database).await?),
            StorageBackend::Memory => {
                info!("using in-memory job storage");
                Arc::new(InMemoryJobRepository::new())
            }
        };
        if config.database.init_schema {
            repo.initialize().await?;
        }
        Ok(Self::with_repository(config, repo))
    }

    /// Builds the remaining components around an existing repository.
    #[must_use]
    pub fn with_repository(config: AppConfig, repo: Arc<dyn JobRepository>) -> Self {
        let service: Arc<dyn JobService> =
            Arc::new(JobUseCase::new(&config.service, Arc::clone(&repo)));
        let broker = Arc::new(MemoryBroker::new(config.broker.channel_capacity));
        Self {
            config,
            repo,
            service,
            broker,
        }
    }

    /// Builds the HTTP module for `mode` and registers its consumer.
    ///
    /// # Errors
    ///
    /// Fails for an unknown consumer name.
    pub fn prepare(&self, mode: &RunMode) -> anyhow::Result<NetworkModule> {
        let consumer = consumer_config(
            mode.consumer_name(),
            &self.config.broker,
            Arc::clone(&self.service),
        )?;
        self.broker.register_consumer(consumer);

        let mut network =
            NetworkModule::new(self.config.network.clone()).with_events(self.broker.publisher());
        if *mode == RunMode::Server {
            network = network.with_rpc(JobRpc::new(Arc::clone(&self.service)));
        }
        Ok(network)
    }

    /// Runs until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Fails for an unknown consumer name, when the listener cannot be bound,
    /// or on a fatal server error.
    pub async fn run(
        self,
        mode: RunMode,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let mut network = self.prepare(&mode)?;
        let port = network.start().await?;
        info!(app = %self.config.app, environment = %self.config.environment, port, ?mode, "starting");

        let broker_task = tokio::spawn({
            let broker = Arc::clone(&self.broker);
            async move { broker.run().await }
        });

        let served = network.serve(shutdown).await;

        self.broker.close();
        match broker_task.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => error!(error = %err, "broker loop failed"),
            Err(err) => error!(error = %err, "broker task panicked"),
        }
        self.repo.close().await;
        info!("shutdown complete");

        served
    }
}
