//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Engine decisions (attach, skip, merge) and request middleware produce:
//!     → tracing events (logging.rs installs the subscriber)
//!     → metrics.rs (request counters, latency histogram)
//! ```
//!
//! # Design Decisions
//! - Structured fields on every event, never formatted-in values
//! - Request ID flows through the request context, not a global
//! - Metrics go through the `metrics` facade; exporting is the embedder's choice

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::record_request;
