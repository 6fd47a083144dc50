//! HTTP forwarding proxy for the xAI API.
//!
//! Inbound paths are normalized onto the upstream `/v1` namespace, the request
//! is streamed to the upstream unchanged, and the response is streamed back
//! with permissive CORS headers added.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
