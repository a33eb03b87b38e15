//! Axum router construction.

use std::time::Duration;

use axum::{routing::any, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::handlers;

/// Per-request budget once the handshake is done. Requests that overrun get
/// `408 Request Timeout`.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application [`Router`]: `/` and every other path map to
/// [`handlers::greet`].
pub fn build() -> Router {
    Router::new()
        .route("/", any(handlers::greet))
        .fallback(handlers::greet)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
}
