//! Wire message schemas for the job service.
//!
//! All types serialize to JSON via `serde_json`, both for RPC bodies and for
//! inbound event payloads.

pub mod job;

pub use job::{Empty, GetListFilter, JobList, JobMessage, JobRequest};
