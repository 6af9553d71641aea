//! Client for the downstream backend.
//!
//! Exactly one GET per [`BackendClient::fetch`]: no retries, no caching. The
//! call runs inside a `client` span whose context is propagated to the
//! backend through the `traceparent` header.

use std::time::{Duration, Instant};

use axum::http::StatusCode;
use reqwest::Url;
use serde_json::Value;
use tracing::field::Empty;
use tracing::{Instrument, Span};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::error::BackendError;
use crate::observability::http::inject_context;
use crate::observability::metrics::HttpMetrics;

/// HTTP client bound to a single backend URL.
#[derive(Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
    metrics: HttpMetrics,
}

impl BackendClient {
    /// Build a client whose calls give up after `timeout` (connect, headers
    /// and body together).
    pub fn new(url: Url, timeout: Duration, metrics: HttpMetrics) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url,
            timeout,
            metrics,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Call the backend and decode its payload.
    pub async fn fetch(&self) -> Result<Value, BackendError> {
        let server_address = self.url.host_str().unwrap_or_default().to_string();
        let span = tracing::info_span!(
            "HTTP GET",
            otel.name = "GET",
            otel.kind = "client",
            otel.status_code = Empty,
            http.request.method = "GET",
            url.full = %self.url,
            server.address = %server_address,
            http.response.status_code = Empty,
            "error.type" = Empty,
        );

        let start = Instant::now();
        let result = self.execute(&span).instrument(span.clone()).await;
        let elapsed = start.elapsed();

        match result {
            Ok((status, payload)) => {
                self.metrics.record_client_request(
                    &server_address,
                    Some(status.as_u16()),
                    None,
                    elapsed,
                );
                tracing::debug!(parent: &span, status = status.as_u16(), "backend call succeeded");
                Ok(payload)
            }
            Err(err) => {
                let error_type = err.error_type();
                span.record("otel.status_code", "ERROR");
                span.record("error.type", error_type.as_str());

                let status = match &err {
                    BackendError::Status(status) => Some(status.as_u16()),
                    _ => None,
                };
                self.metrics
                    .record_client_request(&server_address, status, Some(&error_type), elapsed);
                self.metrics.record_backend_unreachable(&error_type);

                tracing::warn!(parent: &span, error = %err, url = %self.url, "backend call failed");
                Err(err)
            }
        }
    }

    async fn execute(&self, span: &Span) -> Result<(StatusCode, Value), BackendError> {
        let mut request = self
            .client
            .get(self.url.clone())
            .build()
            .map_err(BackendError::Transport)?;
        inject_context(&span.context(), request.headers_mut());

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| BackendError::from_send(e, self.timeout))?;

        let status = response.status();
        span.record("http.response.status_code", status.as_u16());
        if !status.is_success() {
            return Err(BackendError::Status(status));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| BackendError::from_body(e, self.timeout))?;

        Ok((status, decode_payload(&body)))
    }
}

/// Decode a backend body: JSON when it parses, otherwise the body text as a
/// JSON string.
pub fn decode_payload(body: &[u8]) -> Value {
    serde_json::from_slice(body)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()))
}
