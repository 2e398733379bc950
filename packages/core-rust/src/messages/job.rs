//! Request and response bodies of the job RPC surface.
//!
//! Field names are `snake_case` on the wire. Every field is optional on
//! input so that partial payloads (for example an inbound event carrying only
//! `title`, `owner_id` and `price`) decode into a message with empty defaults.

use serde::{Deserialize, Serialize};

use crate::types::Job;

/// Job-shaped record exchanged over RPC and carried by inbound events.
///
/// Timestamps are rendered as RFC 3339 strings; an absent `updated_at` is an
/// empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobMessage {
    pub id: String,
    pub title: String,
    pub description: String,
    pub owner_id: String,
    pub price: f64,
    pub from_date: String,
    pub to_date: String,
    pub created_at: String,
    pub updated_at: String,
}

impl JobMessage {
    /// Converts the caller-editable fields into a domain [`Job`].
    ///
    /// Timestamps are server-owned and never read from the wire.
    #[must_use]
    pub fn to_job(&self) -> Job {
        Job {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            owner_id: self.owner_id.clone(),
            price: self.price,
            from_date: self.from_date.clone(),
            to_date: self.to_date.clone(),
            ..Job::default()
        }
    }
}

impl From<&Job> for JobMessage {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id.clone(),
            title: job.title.clone(),
            description: job.description.clone(),
            owner_id: job.owner_id.clone(),
            price: job.price,
            from_date: job.from_date.clone(),
            to_date: job.to_date.clone(),
            created_at: job.created_at.to_rfc3339(),
            updated_at: job
                .updated_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_default(),
        }
    }
}

/// Selects jobs by `field = value`. `field` is a column name.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRequest {
    pub field: String,
    pub value: String,
}

/// Wire form of a list request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetListFilter {
    pub page: u64,
    pub limit: u64,
    pub order_by: String,
    pub include_deleted: bool,
}

/// One page of jobs. `count` is the number of entries in `jobs`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct JobList {
    pub jobs: Vec<JobMessage>,
    pub count: u64,
}

/// Empty acknowledgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Empty {}
