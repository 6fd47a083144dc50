//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! HTTP layer produces:
//!     → logging.rs (structured log events, TraceLayer spans)
//!     → metrics.rs (request counters and latency histograms)
//!
//! Consumers:
//!     → stdout (fmt layer)
//!     → Metrics endpoint (Prometheus scrape, when enabled)
//! ```

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::init_metrics;
