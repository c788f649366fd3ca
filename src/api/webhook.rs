//! Webhook handler for GitHub push and tag events

use axum::{
    Json,
    body::Bytes,
    extract::{ConnectInfo, State as AxumState},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::net::SocketAddr;
use tracing::{error, info, warn};

use crate::SharedState;
use crate::payload::{normalize, screen_repository};
use crate::signature::verify_signature;

/// Handles the GitHub webhook POST request.
///
/// Runs verify → normalize → watch-list screen → audit insert → publish,
/// stopping at the first failure. Signature and payload failures are the
/// sender's problem (400); store and broker failures are ours (500), and the
/// sender is expected to redeliver the webhook.
pub async fn handle_webhook(
    AxumState(state): AxumState<SharedState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(state.config.signature_header.as_str())
        .and_then(|v| v.to_str().ok());

    if let Err(e) = verify_signature(state.config.github_secret.as_bytes(), &body, signature) {
        warn!("{}: {}", addr, e);
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
            .into_response();
    }

    let payload = match normalize(&body, &state.config.default_environment) {
        Ok(payload) => payload,
        Err(e) => {
            warn!("{}: {}", addr, e);
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
                .into_response();
        }
    };

    if let Err(e) = screen_repository(&payload, &state.config.watched_repositories) {
        warn!("{}: {}", addr, e);
        return (StatusCode::BAD_REQUEST, Json(json!({ "error": e.to_string() })))
            .into_response();
    }

    // Audit row first, publish second. If the publish fails the row stays
    // behind with no queue message; the record id in the log is the handle
    // for manual reconciliation.
    let record_id = match state.audit.record(&payload).await {
        Ok(id) => id,
        Err(e) => {
            error!("Failed to persist deployment record: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    let message = match serde_json::to_vec(&payload) {
        Ok(message) => message,
        Err(e) => {
            error!("Failed to serialize canonical payload: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": e.to_string() })),
            )
                .into_response();
        }
    };

    if let Err(e) = state
        .queue
        .publish(&state.config.exchange, &state.config.route, &message)
        .await
    {
        error!("Record {} persisted but publish failed: {}", record_id, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response();
    }

    info!(
        "Accepted {}@{}:{} (record {})",
        payload.repository, payload.commit, payload.environment, record_id
    );

    (
        StatusCode::OK,
        Json(json!({
            "received": format!(
                "{}@{}:{}",
                payload.repository, payload.commit, payload.environment
            )
        })),
    )
        .into_response()
}
