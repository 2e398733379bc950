//! The job use-case layer.
//!
//! Every storage access made by either entrypoint passes through
//! [`JobUseCase`], which bounds it with the configured timeout and records it
//! in a `tracing` span.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{SubsecRound, Utc};
use jobboard_core::{Job, JobColumn, ListFilter};
use tracing::{debug, info_span, warn, Instrument};

use super::config::ServiceConfig;
use super::error::JobError;
use crate::storage::{JobRepository, RepositoryError};

/// Domain operations on jobs, one per repository operation.
///
/// Used as `Arc<dyn JobService>` by the RPC facade and the ingestion pipeline.
#[async_trait]
pub trait JobService: Send + Sync {
    /// Store a new job. An empty `id` is replaced with a generated one;
    /// `created_at` is always stamped here. Returns the stored job.
    async fn create(&self, job: Job) -> Result<Job, JobError>;

    async fn get(&self, field: JobColumn, value: &str) -> Result<Job, JobError>;

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Job>, JobError>;

    async fn update(&self, job: &Job) -> Result<(), JobError>;

    async fn delete(&self, field: JobColumn, value: &str) -> Result<(), JobError>;
}

// ---------------------------------------------------------------------------
// JobUseCase
// ---------------------------------------------------------------------------

/// Production [`JobService`]: single-attempt, time-bounded, traced.
pub struct JobUseCase {
    repo: Arc<dyn JobRepository>,
    timeout: Duration,
}

impl JobUseCase {
    #[must_use]
    pub fn new(config: &ServiceConfig, repo: Arc<dyn JobRepository>) -> Self {
        Self {
            repo,
            timeout: config.context_timeout(),
        }
    }

    /// Runs one repository call under the service timeout and an
    /// `operation` span. On timeout the call's future is dropped.
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T, JobError>
    where
        F: Future<Output = Result<T, RepositoryError>> + Send,
    {
        #[allow(clippy::cast_possible_truncation)]
        let timeout_ms = self.timeout.as_millis() as u64;
        let span = info_span!(
            "job_usecase",
            operation = operation,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = match tokio::time::timeout(self.timeout, call).await {
                Ok(result) => result.map_err(JobError::from),
                Err(_elapsed) => Err(JobError::Timeout { timeout_ms }),
            };

            #[allow(clippy::cast_possible_truncation)]
            let duration_ms = start.elapsed().as_millis() as u64;
            let outcome = result.as_ref().map_or_else(JobError::kind, |_| "ok");
            let span = tracing::Span::current();
            span.record("duration_ms", duration_ms);
            span.record("outcome", outcome);

            match &result {
                Ok(_) | Err(JobError::NotFound) => {
                    debug!(operation, duration_ms, outcome, "operation complete");
                }
                Err(err) => warn!(operation, duration_ms, error = %err, "operation failed"),
            }
            result
        }
        .instrument(span)
        .await
    }
}

#[async_trait]
impl JobService for JobUseCase {
    async fn create(&self, job: Job) -> Result<Job, JobError> {
        let job = Job {
            id: if job.id.is_empty() {
                Job::generate_id()
            } else {
                job.id
            },
            // TIMESTAMPTZ keeps microseconds; echo what a later read returns.
            created_at: Utc::now().trunc_subsecs(6),
            updated_at: None,
            deleted_at: None,
            ..job
        };
        self.bounded("create", self.repo.create(&job)).await
    }

    async fn get(&self, field: JobColumn, value: &str) -> Result<Job, JobError> {
        self.bounded("get", self.repo.get(field, value)).await
    }

    async fn list(&self, filter: &ListFilter) -> Result<Vec<Job>, JobError> {
        self.bounded("list", self.repo.list(filter)).await
    }

    async fn update(&self, job: &Job) -> Result<(), JobError> {
        self.bounded("update", self.repo.update(job)).await
    }

    async fn delete(&self, field: JobColumn, value: &str) -> Result<(), JobError> {
        self.bounded("delete", self.repo.delete(field, value)).await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
