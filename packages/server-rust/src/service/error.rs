use jobboard_core::{ColumnError, FilterError, InvalidJob};

use crate::storage::RepositoryError;

/// Errors returned by the domain service.
///
/// Repository failures pass through one-to-one; the service itself only adds
/// `Timeout`. `InvalidArgument` is raised at the boundaries while turning
/// caller input into domain values.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("job not found")]
    NotFound,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    #[error("storage failure: {0}")]
    Storage(#[source] anyhow::Error),
}

impl JobError {
    /// Short outcome label for spans and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Timeout { .. } => "timeout",
            Self::Storage(_) => "storage_error",
        }
    }
}

impl From<RepositoryError> for JobError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Storage(source) => Self::Storage(source),
        }
    }
}

impl From<FilterError> for JobError {
    fn from(err: FilterError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<ColumnError> for JobError {
    fn from(err: ColumnError) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}

impl From<InvalidJob> for JobError {
    fn from(err: InvalidJob) -> Self {
        Self::InvalidArgument(err.to_string())
    }
}
