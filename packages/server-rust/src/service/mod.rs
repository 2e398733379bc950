//! Domain service layer.
//!
//! [`JobUseCase`] sits between the two entrypoints (the RPC facade and the
//! ingestion pipeline) and the [`JobRepository`](crate::storage::JobRepository).
//! It owns id assignment, creation timestamps, and the per-call timeout.

pub mod config;
pub mod error;
pub mod job;

pub use config::ServiceConfig;
pub use error::JobError;
pub use job::{JobService, JobUseCase};
