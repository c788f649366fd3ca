//! Generic queue proxy endpoint
//!
//! Lets internal callers that don't speak the webhook format drop an
//! already-shaped message onto the broker. No signature check and no audit
//! row; this endpoint must only be reachable by trusted callers.

use axum::{
    Json,
    body::Bytes,
    extract::State as AxumState,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info, warn};

use crate::SharedState;

/// A relay request: a target queue, optional routing overrides, and the
/// message body itself captured by `flatten`.
#[derive(Debug, Deserialize)]
pub struct RelayRequest {
    pub queue: String,
    pub route: Option<String>,
    pub exchange: Option<String>,
    #[serde(flatten)]
    pub payload: serde_json::Map<String, Value>,
}

/// Handles the queue proxy POST request.
///
/// The body is parsed from raw bytes so callers don't have to set a JSON
/// content type. `route` and `exchange` are stripped from the forwarded
/// message and default to the queue name; everything else, including
/// `queue`, is published verbatim.
pub async fn handle_relay(
    AxumState(state): AxumState<SharedState>,
    body: Bytes,
) -> Response {
    let request: RelayRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            warn!("Could not parse relay request: {}", e);
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("malformed relay request: {}", e) })),
            )
                .into_response();
        }
    };

    let RelayRequest {
        queue,
        route,
        exchange,
        mut payload,
    } = request;
    let exchange = exchange.unwrap_or_else(|| queue.clone());
    let route = route.unwrap_or_else(|| queue.clone());
    payload.insert("queue".to_string(), Value::String(queue));

    let message = match serde_json::to_vec(&Value::Object(payload)) {
        Ok(message) => message,
        Err(e) => {
            error!("Failed to serialize relay message: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    match state.queue.publish(&exchange, &route, &message).await {
        Ok(()) => {
            info!("Relayed message to exchange '{}' route '{}'", exchange, route);
            (StatusCode::OK, Json(json!({ "msg": "success" }))).into_response()
        }
        Err(e) => {
            error!("Relay publish failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
