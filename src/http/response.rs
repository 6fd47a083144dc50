//! Responses the proxy produces itself.
//!
//! Upstream responses are passed through untouched; the only body this crate
//! writes is the generic failure document below. CORS headers are added by
//! the middleware, not here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Message returned whenever the upstream call fails.
pub const PROXY_FAILURE_MESSAGE: &str = "Failed to proxy request";

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// `500` with `{"error": "Failed to proxy request"}`.
///
/// Used for every relay failure regardless of whose fault it was.
pub fn proxy_failure() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: PROXY_FAILURE_MESSAGE,
        }),
    )
        .into_response()
}
