//! Event ingestion pipeline.
//!
//! A [`BrokerConsumer`] runs one sequential loop that hands each message to
//! the [`MessageHandler`] registered for its topic. Consumers are selected by
//! name at startup via [`consumer_config`].

pub mod broker;
pub mod handler;
pub mod memory;

use std::sync::Arc;

pub use broker::{BrokerConsumer, ConsumerConfig, IngestError, MessageHandler};
pub use handler::{JobCreateHandler, INGEST_TIMEOUT};
pub use memory::{BrokerMessage, BrokerPublisher, MemoryBroker, PublishError};

use crate::config::BrokerConfig;
use crate::service::JobService;

/// Consumer that turns job-creation events into stored jobs.
pub const JOB_CREATE_CONSUMER: &str = "job_create_consumer";

/// Names accepted by [`consumer_config`].
pub const CONSUMER_NAMES: &[&str] = &[JOB_CREATE_CONSUMER];

/// Builds the consumer registration for `name`.
///
/// # Errors
///
/// Fails for a name not listed in [`CONSUMER_NAMES`].
pub fn consumer_config(
    name: &str,
    config: &BrokerConfig,
    service: Arc<dyn JobService>,
) -> anyhow::Result<ConsumerConfig> {
    let handler: Arc<dyn MessageHandler> = match name {
        JOB_CREATE_CONSUMER => Arc::new(JobCreateHandler::new(service)),
        other => anyhow::bail!(
            "unknown consumer {other:?} (expected one of: {})",
            CONSUMER_NAMES.join(", ")
        ),
    };

    Ok(ConsumerConfig {
        brokers: config.addresses.clone(),
        topic: config.job_topic.clone(),
        group_id: config.group_id.clone(),
        handler,
    })
}
