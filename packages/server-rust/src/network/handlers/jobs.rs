//! JSON endpoints for the job RPC surface.
//!
//! Each method of `job.JobService` is a `POST /rpc/job.JobService/<Method>`
//! taking and returning the wire messages as JSON. Failures, including
//! bodies that do not decode, render as an HTTP status plus
//! `{"code": ..., "message": ...}`.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use jobboard_core::{Empty, GetListFilter, JobList, JobMessage, JobRequest};

use crate::network::{InFlightGuard, ShutdownController};
use crate::rpc::{JobRpc, RpcCode, RpcStatus};

/// State carried by the job routes.
#[derive(Clone)]
pub struct JobsState {
    pub rpc: JobRpc,
    pub shutdown: Arc<ShutdownController>,
}

impl JobsState {
    /// Admits one call, or refuses it while the server drains.
    fn admit(&self) -> Result<InFlightGuard, RpcStatus> {
        if self.shutdown.is_accepting() {
            Ok(self.shutdown.in_flight_guard())
        } else {
            Err(RpcStatus::unavailable("server is shutting down"))
        }
    }
}

/// Builds the `/rpc/job.JobService/*` routes.
pub fn routes(state: JobsState) -> Router {
    Router::new()
        .route("/rpc/job.JobService/Create", post(create_handler))
        .route("/rpc/job.JobService/Update", post(update_handler))
        .route("/rpc/job.JobService/Get", post(get_handler))
        .route("/rpc/job.JobService/Delete", post(delete_handler))
        .route("/rpc/job.JobService/GetList", post(get_list_handler))
        .with_state(state)
}

async fn create_handler(
    State(state): State<JobsState>,
    payload: Result<Json<JobMessage>, JsonRejection>,
) -> Result<Json<JobMessage>, RpcStatus> {
    let _guard = state.admit()?;
    let Json(req) = payload?;
    state.rpc.create(req).await.map(Json)
}

async fn update_handler(
    State(state): State<JobsState>,
    payload: Result<Json<JobMessage>, JsonRejection>,
) -> Result<Json<JobMessage>, RpcStatus> {
    let _guard = state.admit()?;
    let Json(req) = payload?;
    state.rpc.update(req).await.map(Json)
}

async fn get_handler(
    State(state): State<JobsState>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> Result<Json<JobMessage>, RpcStatus> {
    let _guard = state.admit()?;
    let Json(req) = payload?;
    state.rpc.get(req).await.map(Json)
}

async fn delete_handler(
    State(state): State<JobsState>,
    payload: Result<Json<JobRequest>, JsonRejection>,
) -> Result<Json<Empty>, RpcStatus> {
    let _guard = state.admit()?;
    let Json(req) = payload?;
    state.rpc.delete(req).await.map(Json)
}

async fn get_list_handler(
    State(state): State<JobsState>,
    payload: Result<Json<GetListFilter>, JsonRejection>,
) -> Result<Json<JobList>, RpcStatus> {
    let _guard = state.admit()?;
    let Json(req) = payload?;
    state.rpc.get_list(req).await.map(Json)
}

impl RpcCode {
    /// HTTP status used when this code crosses the JSON transport.
    #[must_use]
    pub fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for RpcStatus {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(RpcCode::InvalidArgument, rejection.body_text())
    }
}

impl IntoResponse for RpcStatus {
    fn into_response(self) -> Response {
        (self.code.http_status(), Json(self)).into_response()
    }
}
