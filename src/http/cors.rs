//! Cross-origin header policy and middleware.
//!
//! The policy is a pure function of the request's `Origin` and the configured
//! allow-list. Methods, headers and max-age are fixed and do not depend on
//! what a preflight asks for.
//!
//! Preflights (`OPTIONS`) are answered here with `204 No Content` and never
//! reach the relay. Every other response, success or failure, gets the CORS
//! headers merged in.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::http::server::AppState;

pub const ALLOW_METHODS: &str = "GET, POST, PUT, DELETE, OPTIONS";
pub const ALLOW_HEADERS: &str = "Content-Type, Authorization, X-Requested-With, OpenAI-Organization";
pub const MAX_AGE_SECS: &str = "86400";

const WILDCARD: &str = "*";

/// Static allow-list based CORS policy.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: Vec<HeaderValue>,
    wildcard: bool,
}

impl CorsPolicy {
    /// Build a policy from configured origins. Entries that are not valid
    /// header values are skipped (config validation rejects them earlier).
    pub fn new<I, S>(allowed_origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed_origins: Vec<HeaderValue> = allowed_origins
            .into_iter()
            .filter_map(|o| HeaderValue::from_str(o.as_ref()).ok())
            .collect();
        let wildcard = allowed_origins.iter().any(|o| o == WILDCARD);
        Self {
            allowed_origins,
            wildcard,
        }
    }

    /// Value for `Access-Control-Allow-Origin` given the request's origin.
    ///
    /// An allowed (or wildcard-matched) origin is echoed back, a missing one
    /// echoes as empty. Otherwise the first configured entry is used.
    pub fn allow_origin(&self, origin: Option<&HeaderValue>) -> HeaderValue {
        let origin = origin.cloned().unwrap_or_else(|| HeaderValue::from_static(""));
        if self.wildcard || self.allowed_origins.contains(&origin) {
            return origin;
        }
        self.allowed_origins
            .first()
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static(""))
    }

    /// The full CORS header set for a request origin.
    pub fn headers_for(&self, origin: Option<&HeaderValue>) -> HeaderMap {
        let mut headers = HeaderMap::with_capacity(4);
        self.apply(&mut headers, origin);
        headers
    }

    /// Insert (or overwrite) the CORS headers, keeping everything else.
    pub fn apply(&self, headers: &mut HeaderMap, origin: Option<&HeaderValue>) {
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, self.allow_origin(origin));
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        );
        headers.insert(
            header::ACCESS_CONTROL_MAX_AGE,
            HeaderValue::from_static(MAX_AGE_SECS),
        );
    }

    /// Empty `204` answer to a preflight.
    pub fn preflight(&self, origin: Option<&HeaderValue>) -> Response {
        (StatusCode::NO_CONTENT, self.headers_for(origin)).into_response()
    }
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self::new([WILDCARD])
    }
}

/// Answers preflights directly and decorates every other response.
pub async fn cors_middleware(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let origin = req.headers().get(header::ORIGIN).cloned();

    if req.method() == Method::OPTIONS {
        tracing::debug!(origin = ?origin, path = %req.uri().path(), "Answering preflight");
        return state.cors.preflight(origin.as_ref());
    }

    let mut response = next.run(req).await;
    state.cors.apply(response.headers_mut(), origin.as_ref());
    response
}
