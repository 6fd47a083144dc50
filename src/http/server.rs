//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the proxy handler on every path
//! - Wire up middleware (tracing, CORS)
//! - Serve on a listener until the shutdown signal fires
//! - Relay requests to the upstream and map failures to the generic 500

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware,
    response::Response,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ProxyConfig;
use crate::http::cors::{cors_middleware, CorsPolicy};
use crate::http::relay::{HttpUpstream, RelayError, Upstream, UpstreamRequest};
use crate::http::response::proxy_failure;
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn Upstream>,
    pub cors: Arc<CorsPolicy>,
    pub base_url: Arc<str>,
}

/// HTTP server for the proxy.
pub struct HttpServer {
    router: Router,
    config: ProxyConfig,
}

impl HttpServer {
    /// Create a server that relays to the configured upstream over HTTP(S).
    pub fn new(config: ProxyConfig) -> Result<Self, RelayError> {
        let upstream = HttpUpstream::new(&config.upstream)?;
        Ok(Self::with_upstream(config, Arc::new(upstream)))
    }

    /// Create a server around an arbitrary upstream implementation.
    pub fn with_upstream(config: ProxyConfig, upstream: Arc<dyn Upstream>) -> Self {
        let state = AppState {
            upstream,
            cors: Arc::new(CorsPolicy::new(&config.cors.allowed_origins)),
            base_url: Arc::from(config.upstream.base_url.as_str()),
        };

        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(state: AppState) -> Router {
        // Every path is proxied, so the handler is the fallback.
        Router::new()
            .fallback(proxy_handler)
            .layer(middleware::from_fn_with_state(state.clone(), cors_middleware))
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// The router, for serving or driving directly in tests.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.base_url,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Main proxy handler.
/// Resolves the target, relays the request and passes the response back.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match relay(&state, request_id, request).await {
        Ok(response) => {
            let status = response.status();
            tracing::debug!(
                request_id = %request_id,
                method = %method,
                path = %path,
                status = %status,
                "Upstream responded"
            );
            metrics::record_request(method.as_str(), status.as_u16(), start_time);
            response
        }
        Err(e) => {
            tracing::error!(
                request_id = %request_id,
                method = %method,
                path = %path,
                error = %e,
                "Proxy error"
            );
            let response = proxy_failure();
            metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
            response
        }
    }
}

async fn relay(
    state: &AppState,
    request_id: Uuid,
    request: Request<Body>,
) -> Result<Response, RelayError> {
    let upstream_request = UpstreamRequest::from_inbound(&state.base_url, request)?;

    tracing::debug!(
        request_id = %request_id,
        method = %upstream_request.method,
        target = %upstream_request.url,
        "Proxying request"
    );

    state.upstream.send(upstream_request).await
}
