//! Prometheus metrics and structured logging for xalgo.
//!
//! - Structured logging with tracing (JSON in production)
//! - Prometheus metrics for submissions, aborts, fallbacks and completions

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
