//! HTTP surface of the relay
//!
//! Two POST endpoints: the authenticated GitHub webhook ingress and the
//! generic queue proxy for trusted internal callers.

pub mod relay;
pub mod webhook;

pub use relay::handle_relay;
pub use webhook::handle_webhook;

use axum::{Router, routing};

use crate::SharedState;

/// Build the application router over the given state.
///
/// Taking the state as an argument keeps configuration out of globals, so
/// tests can assemble the app around substituted watch-lists, stores, and
/// gateways.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/webhooks", routing::post(handle_webhook))
        .route("/rabbit", routing::post(handle_relay))
        .with_state(state)
}
