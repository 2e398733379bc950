//! RPC facade over the job service.
//!
//! Transport-agnostic: [`JobRpc`] speaks the wire message types from
//! `jobboard_core::messages`, and the HTTP endpoints in
//! `network::handlers::jobs` expose it as JSON.

pub mod job;
pub mod status;

pub use job::JobRpc;
pub use status::{RpcCode, RpcStatus};
