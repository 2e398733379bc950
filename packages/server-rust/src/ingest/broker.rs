//! Contracts between a message broker and the handlers it drives.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

/// Failure to process one inbound message.
///
/// Returned to the consumer loop, which logs it and moves on to the next
/// message.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to decode message payload: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Processes messages delivered on one topic.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, key: &[u8], value: &[u8]) -> Result<(), IngestError>;
}

/// Binds a handler to a topic.
#[derive(Clone)]
pub struct ConsumerConfig {
    pub brokers: Vec<String>,
    pub topic: String,
    pub group_id: String,
    pub handler: Arc<dyn MessageHandler>,
}

impl fmt::Debug for ConsumerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConsumerConfig")
            .field("brokers", &self.brokers)
            .field("topic", &self.topic)
            .field("group_id", &self.group_id)
            .finish_non_exhaustive()
    }
}

/// A consumer loop that feeds broker messages to registered handlers.
///
/// Lifecycle: `register_consumer` (any number of times), then `run` on a
/// dedicated task, then `close` from anywhere to make `run` return.
#[async_trait]
pub trait BrokerConsumer: Send + Sync {
    fn register_consumer(&self, config: ConsumerConfig);

    /// Delivers messages one at a time until [`close`](Self::close) is called.
    ///
    /// # Errors
    ///
    /// Returns an error only if the loop cannot start or the underlying
    /// transport fails irrecoverably. Handler errors never end the loop.
    async fn run(&self) -> anyhow::Result<()>;

    fn close(&self);
}
