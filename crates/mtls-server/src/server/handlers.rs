//! Axum request handlers.

use axum::{http::header, response::IntoResponse};
use common::protocol::{GREETING, GREETING_CONTENT_TYPE};

/// Any method, any path: reply with the fixed greeting.
///
/// Reaching this handler means the client already passed certificate
/// verification, so there is nothing left to check.
pub async fn greet() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, GREETING_CONTENT_TYPE)], GREETING)
}
