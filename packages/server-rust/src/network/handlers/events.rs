//! HTTP bridge into the in-process broker.
//!
//! `POST /events/{topic}` queues the raw request body as one message on
//! `topic`. The optional `x-message-key` header becomes the message key.
//! Delivery is asynchronous: a 202 means queued, not processed.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::warn;

use crate::ingest::BrokerPublisher;

pub const MESSAGE_KEY_HEADER: &str = "x-message-key";

/// Builds the `/events/{topic}` route.
pub fn routes(publisher: BrokerPublisher) -> Router {
    Router::new()
        .route("/events/{topic}", post(publish_handler))
        .with_state(publisher)
}

async fn publish_handler(
    State(publisher): State<BrokerPublisher>,
    Path(topic): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    let key = headers
        .get(MESSAGE_KEY_HEADER)
        .map(|v| Bytes::copy_from_slice(v.as_bytes()))
        .unwrap_or_default();

    publisher.publish(topic.as_str(), key, body).map_err(|err| {
        warn!(topic = %topic, error = %err, "failed to queue event");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": err.to_string() })),
        )
    })?;

    Ok(StatusCode::ACCEPTED)
}
