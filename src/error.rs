//! Error types.
//!
//! The request path has a single failure kind, [`BackendError`]: whatever went
//! wrong downstream, the caller sees the same `500` body. [`TelemetryError`]
//! only occurs at startup.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::protocol::{ErrorResponse, BACKEND_UNREACHABLE};

/// The backend could not produce a usable response.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Connection refused, DNS failure, reset, or any other transport error.
    #[error("backend request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("backend request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with a non-2xx status.
    #[error("backend responded with status {0}")]
    Status(StatusCode),

    #[error("failed to read backend response body: {0}")]
    Body(#[source] reqwest::Error),
}

impl BackendError {
    /// Classify a reqwest error raised while sending the request.
    pub fn from_send(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Transport(err)
        }
    }

    /// Classify a reqwest error raised while reading the body.
    pub fn from_body(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else {
            Self::Body(err)
        }
    }

    /// Low-cardinality label used for the `error.type` span attribute and
    /// metric attribute.
    pub fn error_type(&self) -> String {
        match self {
            Self::Transport(e) if e.is_connect() => "connect".to_string(),
            Self::Transport(_) => "transport".to_string(),
            Self::Timeout(_) => "timeout".to_string(),
            Self::Status(status) => status.as_u16().to_string(),
            Self::Body(_) => "body".to_string(),
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: BACKEND_UNREACHABLE.to_string(),
            }),
        )
            .into_response()
    }
}

/// Failure while building the telemetry pipeline.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to set up trace export: {0}")]
    Trace(#[from] opentelemetry::trace::TraceError),

    #[error("failed to set up metric export: {0}")]
    Metrics(#[from] opentelemetry::metrics::MetricsError),

    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing_subscriber::util::TryInitError),

    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
}
