//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Inbound request path + query
//!     → resolver.rs (normalize onto /v1, strip prefix)
//!     → UpstreamTarget (base URL + suffix + query)
//!     → Request relay
//! ```
//!
//! # Design Decisions
//! - Resolution is a total, pure function: every path maps to a target
//! - No path validation; the upstream is the authority on what exists
//! - Query strings are never parsed or re-encoded

pub mod resolver;

pub use resolver::{resolve_path, upstream_suffix, UpstreamTarget, DEFAULT_ENDPOINT};
