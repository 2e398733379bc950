//! In-process broker.
//!
//! Messages are queued on a bounded mpsc channel by a [`BrokerPublisher`]
//! and delivered by a single [`MemoryBroker::run`] loop, strictly in order,
//! to every consumer registered for the message's topic.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info, warn};

use super::broker::{BrokerConsumer, ConsumerConfig};

/// One message as delivered by a producer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerMessage {
    pub topic: String,
    pub key: Bytes,
    pub value: Bytes,
}

/// Reasons a message could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum PublishError {
    #[error("broker is closed")]
    Closed,
    #[error("broker queue is full")]
    Full,
}

/// Cloneable producer handle for a [`MemoryBroker`].
#[derive(Debug, Clone)]
pub struct BrokerPublisher {
    tx: mpsc::Sender<BrokerMessage>,
    closed: watch::Receiver<bool>,
}

impl BrokerPublisher {
    /// Queues a message without waiting for queue space.
    ///
    /// # Errors
    ///
    /// `PublishError::Closed` once the broker has been closed,
    /// `PublishError::Full` when the queue is at capacity.
    pub fn publish(
        &self,
        topic: impl Into<String>,
        key: impl Into<Bytes>,
        value: impl Into<Bytes>,
    ) -> Result<(), PublishError> {
        if *self.closed.borrow() {
            return Err(PublishError::Closed);
        }
        self.tx
            .try_send(BrokerMessage {
                topic: topic.into(),
                key: key.into(),
                value: value.into(),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => PublishError::Full,
                mpsc::error::TrySendError::Closed(_) => PublishError::Closed,
            })
    }
}

/// Single-process [`BrokerConsumer`].
pub struct MemoryBroker {
    consumers: RwLock<Vec<ConsumerConfig>>,
    tx: mpsc::Sender<BrokerMessage>,
    rx: Mutex<mpsc::Receiver<BrokerMessage>>,
    closed: watch::Sender<bool>,
}

impl MemoryBroker {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let (closed, _) = watch::channel(false);
        Self {
            consumers: RwLock::new(Vec::new()),
            tx,
            rx: Mutex::new(rx),
            closed,
        }
    }

    #[must_use]
    pub fn publisher(&self) -> BrokerPublisher {
        BrokerPublisher {
            tx: self.tx.clone(),
            closed: self.closed.subscribe(),
        }
    }

    #[must_use]
    pub fn consumer_count(&self) -> usize {
        self.consumers.read().len()
    }

    async fn dispatch(&self, message: BrokerMessage) {
        let handlers: Vec<_> = self
            .consumers
            .read()
            .iter()
            .filter(|c| c.topic == message.topic)
            .map(|c| c.handler.clone())
            .collect();

        if handlers.is_empty() {
            debug!(topic = %message.topic, "no consumer registered for topic, dropping message");
            return;
        }

        for handler in handlers {
            if let Err(err) = handler.handle(&message.key, &message.value).await {
                warn!(topic = %message.topic, error = %err, "failed to process message");
            }
        }
    }
}

#[async_trait]
impl BrokerConsumer for MemoryBroker {
    fn register_consumer(&self, config: ConsumerConfig) {
        info!(
            topic = %config.topic,
            group_id = %config.group_id,
            brokers = ?config.brokers,
            "consumer registered"
        );
        self.consumers.write().push(config);
    }

    async fn run(&self) -> anyhow::Result<()> {
        let mut closed = self.closed.subscribe();
        if *closed.borrow_and_update() {
            return Ok(());
        }
        let mut rx = self
            .rx
            .try_lock()
            .map_err(|_| anyhow::anyhow!("broker loop is already running"))?;

        info!(consumers = self.consumer_count(), "broker loop started");
        loop {
            tokio::select! {
                biased;
                _ = closed.changed() => break,
                message = rx.recv() => match message {
                    Some(message) => self.dispatch(message).await,
                    None => break,
                },
            }
        }
        info!("broker loop stopped");
        Ok(())
    }

    fn close(&self) {
        self.closed.send_replace(true);
    }
}
