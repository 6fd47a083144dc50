//! Request relay to the upstream API.
//!
//! # Responsibilities
//! - Turn an inbound request into an [`UpstreamRequest`] for a resolved target
//! - Send it through an [`Upstream`] implementation
//! - Hand the upstream response back with its body still streaming
//!
//! # Design Decisions
//! - Bodies are streamed in both directions, never buffered
//! - Redirects are followed by the client, not surfaced to the caller; a
//!   redirect the client cannot replay (307/308 with a streamed body) fails
//!   the relay
//! - The upstream reason phrase is carried over to the caller
//! - No retries: a failed call is terminal for that request
//! - Dropping the returned future aborts the upstream call, so a client
//!   disconnect cancels the relay

use std::time::Duration;

use axum::{
    body::{Body, HttpBody},
    http::{header, HeaderMap, Method, Request, Response, StatusCode},
};
use futures_util::{future::BoxFuture, TryStreamExt};
use hyper::ext::ReasonPhrase;
use thiserror::Error;
use url::Url;

use crate::config::UpstreamConfig;
use crate::http::headers;
use crate::routing::UpstreamTarget;

/// Errors raised while relaying a request.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The resolved target could not be parsed as a URL.
    #[error("invalid upstream target: {0}")]
    InvalidTarget(#[from] url::ParseError),

    /// The upstream could not be reached or answered with a protocol error.
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    /// The upstream redirected, but the request body could not be replayed.
    #[error("upstream redirect {0} could not be followed")]
    UnfollowableRedirect(StatusCode),

    /// The HTTP client could not be constructed.
    #[error("failed to build upstream client: {0}")]
    Client(#[source] reqwest::Error),
}

/// An outbound request, fully resolved and ready to send.
#[derive(Debug)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Body,
}

impl UpstreamRequest {
    /// Build the outbound request for `request` against `base_url`.
    ///
    /// Method, end-to-end headers and the body stream move over unchanged.
    pub fn from_inbound(base_url: &str, request: Request<Body>) -> Result<Self, RelayError> {
        let (parts, body) = request.into_parts();
        let target = UpstreamTarget::new(base_url, parts.uri.path(), parts.uri.query());
        let url = Url::parse(target.as_str())?;

        Ok(Self {
            method: parts.method,
            url,
            headers: headers::outbound(&parts.headers),
            body,
        })
    }
}

/// Something that can carry an [`UpstreamRequest`] to the API.
pub trait Upstream: Send + Sync {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'static, Result<Response<Body>, RelayError>>;
}

/// Production upstream backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Build the client from upstream settings.
    pub fn new(config: &UpstreamConfig) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(RelayError::Client)?;

        Ok(Self { client })
    }
}

impl Upstream for HttpUpstream {
    fn send(&self, request: UpstreamRequest) -> BoxFuture<'static, Result<Response<Body>, RelayError>> {
        let client = self.client.clone();

        Box::pin(async move {
            let UpstreamRequest {
                method,
                url,
                headers: request_headers,
                body,
            } = request;

            let mut outbound = client.request(method, url).headers(request_headers);
            if !body.is_end_stream() {
                outbound = outbound.body(reqwest::Body::wrap_stream(body.into_data_stream()));
            }
            let upstream = outbound.send().await?;

            let status = upstream.status();
            if status.is_redirection() && upstream.headers().contains_key(header::LOCATION) {
                return Err(RelayError::UnfollowableRedirect(status));
            }

            let headers = headers::end_to_end(upstream.headers());
            let reason = upstream.extensions().get::<ReasonPhrase>().cloned();
            let stream = upstream.bytes_stream().inspect_err(|e| {
                tracing::error!(error = %e, "Upstream body stream failed");
            });

            let mut response = Response::new(Body::from_stream(stream));
            *response.status_mut() = status;
            *response.headers_mut() = headers;
            if let Some(reason) = reason {
                response.extensions_mut().insert(reason);
            }
            Ok(response)
        })
    }
}
