//! Status values returned across the RPC boundary.

use std::fmt;

use serde::Serialize;

use crate::service::JobError;

/// Canonical status codes surfaced to RPC callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RpcCode {
    InvalidArgument,
    NotFound,
    DeadlineExceeded,
    /// The server is draining and no longer admits calls.
    Unavailable,
    Internal,
}

impl RpcCode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::NotFound => "NOT_FOUND",
            Self::DeadlineExceeded => "DEADLINE_EXCEEDED",
            Self::Unavailable => "UNAVAILABLE",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for RpcCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&JobError> for RpcCode {
    fn from(err: &JobError) -> Self {
        match err {
            JobError::NotFound => Self::NotFound,
            JobError::InvalidArgument(_) => Self::InvalidArgument,
            JobError::Timeout { .. } => Self::DeadlineExceeded,
            JobError::Storage(_) => Self::Internal,
        }
    }
}

/// A failed RPC call: a code plus a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct RpcStatus {
    pub code: RpcCode,
    pub message: String,
}

impl RpcStatus {
    #[must_use]
    pub fn new(code: RpcCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(RpcCode::Unavailable, message)
    }

    /// Wraps a service error as `"failed to <action>: <cause>"`.
    #[must_use]
    pub fn from_job_error(action: &str, err: &JobError) -> Self {
        Self::new(RpcCode::from(err), format!("failed to {action}: {err}"))
    }
}
