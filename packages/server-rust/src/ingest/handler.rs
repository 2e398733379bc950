//! Handler for job-creation events.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jobboard_core::{Job, JobMessage};
use tracing::{error, info, instrument, warn};

use super::broker::{IngestError, MessageHandler};
use crate::service::JobService;

/// Upper bound on one event's call into the job service.
pub const INGEST_TIMEOUT: Duration = Duration::from_secs(7);

/// Turns job-creation events into [`JobService::create`] calls.
///
/// Only decode failures are reported back to the consumer loop. Anything that
/// goes wrong after the payload is understood is logged here and dropped.
pub struct JobCreateHandler {
    service: Arc<dyn JobService>,
    timeout: Duration,
}

impl JobCreateHandler {
    #[must_use]
    pub fn new(service: Arc<dyn JobService>) -> Self {
        Self {
            service,
            timeout: INGEST_TIMEOUT,
        }
    }

    /// Decodes an event payload. Missing fields take their empty defaults.
    ///
    /// # Errors
    ///
    /// `IngestError::Decode` when the payload is not a JSON object of the
    /// expected shape.
    pub fn decode(value: &[u8]) -> Result<JobMessage, IngestError> {
        Ok(serde_json::from_slice(value)?)
    }

    /// Builds the job to create. Dates are not carried by events.
    #[must_use]
    pub fn create_command(message: &JobMessage) -> Job {
        Job {
            id: message.id.clone(),
            title: message.title.clone(),
            description: message.description.clone(),
            owner_id: message.owner_id.clone(),
            price: message.price,
            ..Job::default()
        }
    }

    /// Handles one event and returns the stored job, if one was created.
    ///
    /// # Errors
    ///
    /// `IngestError::Decode` for an undecodable payload.
    pub async fn process(&self, value: &[u8]) -> Result<Option<Job>, IngestError> {
        let message = Self::decode(value)?;
        let job = Self::create_command(&message);

        if let Err(err) = job.validate() {
            warn!(error = %err, "rejecting job event");
            return Ok(None);
        }

        match tokio::time::timeout(self.timeout, self.service.create(job)).await {
            Ok(Ok(job)) => {
                info!(job_id = %job.id, owner_id = %job.owner_id, "job created from event");
                Ok(Some(job))
            }
            Ok(Err(err)) => {
                error!(error = %err, "failed to create job from event");
                Ok(None)
            }
            Err(_elapsed) => {
                #[allow(clippy::cast_possible_truncation)]
                let timeout_ms = self.timeout.as_millis() as u64;
                error!(timeout_ms, "timed out creating job from event");
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl MessageHandler for JobCreateHandler {
    #[instrument(name = "job_create_handler", skip_all, fields(key = %String::from_utf8_lossy(key)))]
    async fn handle(&self, key: &[u8], value: &[u8]) -> Result<(), IngestError> {
        self.process(value).await.map(|_| ())
    }
}
