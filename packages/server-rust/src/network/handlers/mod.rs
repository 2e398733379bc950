//! HTTP handlers.
//!
//! Health probes share [`AppState`]. The job RPC and event endpoints are
//! self-contained routers carrying their own state, mounted only when the
//! process runs the corresponding component.

pub mod events;
pub mod health;
pub mod jobs;

pub use health::{health_handler, liveness_handler, readiness_handler};

use std::sync::Arc;
use std::time::Instant;

use super::ShutdownController;

/// State shared by the health endpoints.
#[derive(Clone)]
pub struct AppState {
    /// Graceful shutdown controller with health state and in-flight tracking.
    pub shutdown: Arc<ShutdownController>,
    /// Whether the job RPC endpoints are mounted.
    pub rpc_enabled: bool,
    /// Whether the event ingestion endpoint is mounted.
    pub ingest_enabled: bool,
    /// Server process start time, used for uptime calculation.
    pub start_time: Instant,
}
