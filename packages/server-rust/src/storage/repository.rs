//! The job persistence contract.

use async_trait::async_trait;
use jobboard_core::{Job, JobColumn, ListFilter};

/// Errors reported by a [`JobRepository`].
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No live row matched a lookup, or an update targeted an absent id.
    #[error("job not found")]
    NotFound,
    /// Connection, constraint, or query failure.
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl From<sqlx::Error> for RepositoryError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound,
            other => Self::Storage(other.into()),
        }
    }
}

/// Persistence backend for jobs.
///
/// Implementations own the on-disk representation exclusively. Reads never
/// return soft-deleted rows unless the filter explicitly opts in.
///
/// Used as `Arc<dyn JobRepository>`.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Insert a new row with the job's id and `created_at` as given.
    /// Returns the stored job unchanged.
    async fn create(&self, job: &Job) -> Result<Job, RepositoryError>;

    /// Fetch one non-deleted job where `field = value`.
    async fn get(&self, field: JobColumn, value: &str) -> Result<Job, RepositoryError>;

    /// List jobs matching the filter. An empty result is not an error.
    async fn list(&self, filter: &ListFilter) -> Result<Vec<Job>, RepositoryError>;

    /// Overwrite the mutable columns of the job with the same id and stamp
    /// `updated_at`. Fails with `NotFound` when no row was affected.
    async fn update(&self, job: &Job) -> Result<(), RepositoryError>;

    /// Soft-delete every row where `field = value`. Matching nothing is not
    /// an error.
    async fn delete(&self, field: JobColumn, value: &str) -> Result<(), RepositoryError>;

    /// One-time initialization (e.g., create the table for local runs).
    async fn initialize(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Release resources and close connections.
    async fn close(&self) {}
}
