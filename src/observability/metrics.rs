//! HTTP metrics.
//!
//! Key metrics:
//! - http.server.request.duration: Histogram of inbound request latency
//! - http.client.request.duration: Histogram of backend call latency
//! - frontend_backend_unreachable_total: Counter of failed backend calls
//! - processed_jobs_total: Counter of `/work` jobs completed by the backend

use std::time::Duration;

use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;

/// Instruments recorded by the server middleware and the backend client.
#[derive(Debug, Clone)]
pub struct HttpMetrics {
    /// Inbound request duration in seconds.
    pub server_duration: Histogram<f64>,
    /// Backend call duration in seconds.
    pub client_duration: Histogram<f64>,
    /// Backend calls that ended in the "Backend is unreachable" response.
    pub backend_unreachable: Counter<u64>,
}

impl HttpMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            server_duration: meter
                .f64_histogram("http.server.request.duration")
                .with_description("Duration of inbound HTTP requests")
                .with_unit("s")
                .init(),
            client_duration: meter
                .f64_histogram("http.client.request.duration")
                .with_description("Duration of outbound HTTP requests to the backend")
                .with_unit("s")
                .init(),
            backend_unreachable: meter
                .u64_counter("frontend_backend_unreachable_total")
                .with_description("Backend calls that failed and produced a 500 response")
                .with_unit("1")
                .init(),
        }
    }

    /// Record one served request.
    pub fn record_server_request(&self, method: &str, route: &str, status: u16, elapsed: Duration) {
        let attrs = [
            KeyValue::new("http.request.method", method.to_string()),
            KeyValue::new("http.route", route.to_string()),
            KeyValue::new("http.response.status_code", i64::from(status)),
        ];
        self.server_duration.record(elapsed.as_secs_f64(), &attrs);
    }

    /// Record one backend call. `status` is absent when no response arrived;
    /// `error_type` is set for every failed call.
    pub fn record_client_request(
        &self,
        server_address: &str,
        status: Option<u16>,
        error_type: Option<&str>,
        elapsed: Duration,
    ) {
        let mut attrs = vec![
            KeyValue::new("http.request.method", "GET"),
            KeyValue::new("server.address", server_address.to_string()),
        ];
        if let Some(status) = status {
            attrs.push(KeyValue::new("http.response.status_code", i64::from(status)));
        }
        if let Some(error_type) = error_type {
            attrs.push(KeyValue::new("error.type", error_type.to_string()));
        }
        self.client_duration.record(elapsed.as_secs_f64(), &attrs);
    }

    pub fn record_backend_unreachable(&self, error_type: &str) {
        self.backend_unreachable
            .add(1, &[KeyValue::new("error.type", error_type.to_string())]);
    }
}

/// Business instruments of the backend service.
#[derive(Debug, Clone)]
pub struct JobMetrics {
    /// Jobs completed successfully.
    pub processed: Counter<u64>,
}

impl JobMetrics {
    pub fn new(meter: &Meter) -> Self {
        Self {
            processed: meter
                .u64_counter("processed_jobs_total")
                .with_description("Total number of business jobs successfully processed")
                .init(),
        }
    }

    pub fn record_processed(&self) {
        self.processed.add(1, &[]);
    }
}
