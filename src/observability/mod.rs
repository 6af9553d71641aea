//! OpenTelemetry observability infrastructure.
//!
//! Provides:
//! - An explicit [`Telemetry`] context owning the tracer and meter providers
//! - Structured logging bridged to OpenTelemetry spans
//! - HTTP instruments and W3C trace context propagation for the server
//!   middleware and the backend client

pub mod http;
pub mod metrics;
pub mod telemetry;
pub mod tracing;

pub use metrics::{HttpMetrics, JobMetrics};
pub use telemetry::{Telemetry, TelemetryConfig};
