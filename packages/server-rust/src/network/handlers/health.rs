//! Orchestrator probes.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use super::AppState;
use crate::network::HealthState;

/// Body of `GET /health`.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub state: &'static str,
    /// Job RPC endpoints are mounted.
    pub rpc: bool,
    /// Event endpoint and consumer are mounted.
    pub ingest: bool,
    /// RPC calls admitted and not yet answered.
    pub in_flight: u64,
    pub uptime_secs: u64,
}

/// Always 200; callers read `state` for the lifecycle.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        state: state.shutdown.health_state().as_str(),
        rpc: state.rpc_enabled,
        ingest: state.ingest_enabled,
        in_flight: state.shutdown.in_flight_count(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

pub async fn liveness_handler() -> StatusCode {
    StatusCode::OK
}

/// 200 only while serving; a draining process drops out of rotation.
pub async fn readiness_handler(State(state): State<AppState>) -> StatusCode {
    match state.shutdown.health_state() {
        HealthState::Ready => StatusCode::OK,
        HealthState::Starting | HealthState::Draining | HealthState::Stopped => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Instant;

    use super::*;
    use crate::network::ShutdownController;

    fn consumer_state() -> AppState {
        AppState {
            shutdown: Arc::new(ShutdownController::new()),
            rpc_enabled: false,
            ingest_enabled: true,
            start_time: Instant::now(),
        }
    }

    #[tokio::test]
    async fn report_describes_a_consumer_process() {
        let state = consumer_state();
        state.shutdown.set_ready();

        let Json(report) = health_handler(State(state)).await;
        assert_eq!(report.state, "ready");
        assert!(!report.rpc);
        assert!(report.ingest);
        assert_eq!(report.in_flight, 0);
    }

    #[tokio::test]
    async fn report_counts_calls_held_during_drain() {
        let state = consumer_state();
        let _call = state.shutdown.in_flight_guard();
        state.shutdown.trigger_shutdown();

        let Json(report) = health_handler(State(state)).await;
        assert_eq!(report.state, "draining");
        assert_eq!(report.in_flight, 1);
    }

    #[tokio::test]
    async fn readiness_follows_lifecycle() {
        let state = consumer_state();
        let probe = || readiness_handler(State(state.clone()));

        assert_eq!(probe().await, StatusCode::SERVICE_UNAVAILABLE);
        state.shutdown.set_ready();
        assert_eq!(probe().await, StatusCode::OK);
        state.shutdown.trigger_shutdown();
        assert_eq!(probe().await, StatusCode::SERVICE_UNAVAILABLE);
        assert!(state.shutdown.wait_for_drain(std::time::Duration::ZERO).await);
        assert_eq!(probe().await, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(liveness_handler().await, StatusCode::OK);
    }
}
