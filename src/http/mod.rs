//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, TraceLayer)
//!     → cors.rs (OPTIONS answered here with 204)
//!     → relay.rs (resolve target, copy end-to-end headers, stream body)
//!     → upstream API
//!     → relay.rs (status, headers, streaming body)
//!     → cors.rs (merge CORS headers)
//!     → Send to client
//!
//! On upstream failure:
//!     relay.rs error → response.rs (500 JSON) → cors.rs → client
//! ```

pub mod cors;
pub mod headers;
pub mod relay;
pub mod response;
pub mod server;

pub use cors::CorsPolicy;
pub use relay::{HttpUpstream, RelayError, Upstream, UpstreamRequest};
pub use server::HttpServer;
