//! HTTP trace propagation and server-side request instrumentation.
//!
//! Inbound requests get a `server` span whose parent is taken from the W3C
//! `traceparent` header; the backend client injects its own span context into
//! the outbound request with [`inject_context`].

use std::time::{Duration, Instant};

use axum::extract::{MatchedPath, Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use opentelemetry::propagation::{Extractor, Injector, TextMapPropagator};
use opentelemetry::Context;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use tracing::field::Empty;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::observability::metrics::HttpMetrics;

/// `http.route` of requests no route matched (404s).
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Writes propagation fields into an HTTP header map.
pub struct HeaderInjector<'a>(pub &'a mut HeaderMap);

impl Injector for HeaderInjector<'_> {
    fn set(&mut self, key: &str, value: String) {
        let Ok(name) = HeaderName::from_bytes(key.as_bytes()) else {
            tracing::debug!(%key, "failed to parse header name");
            return;
        };
        let Ok(value) = HeaderValue::from_str(&value) else {
            tracing::debug!(%value, "failed to parse header value");
            return;
        };
        self.0.insert(name, value);
    }
}

/// Reads propagation fields from an HTTP header map.
pub struct HeaderExtractor<'a>(pub &'a HeaderMap);

impl Extractor for HeaderExtractor<'_> {
    fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(|v| v.to_str().ok())
    }

    fn keys(&self) -> Vec<&str> {
        self.0.keys().map(HeaderName::as_str).collect()
    }
}

/// Parent context carried by the request headers, empty if there is none.
pub fn extract_context(headers: &HeaderMap) -> Context {
    TraceContextPropagator::new().extract(&HeaderExtractor(headers))
}

/// Write `cx` into `headers` as `traceparent`/`tracestate`.
pub fn inject_context(cx: &Context, headers: &mut HeaderMap) {
    TraceContextPropagator::new().inject_context(cx, &mut HeaderInjector(headers));
}

/// Server middleware: one `server` span, one duration sample and one log line
/// per request.
pub async fn trace_request(State(metrics): State<HttpMetrics>, req: Request, next: Next) -> Response {
    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = route_label(req.extensions().get::<MatchedPath>().map(MatchedPath::as_str));

    let span = tracing::info_span!(
        "HTTP request",
        otel.name = %format!("{method} {route}"),
        otel.kind = "server",
        otel.status_code = Empty,
        http.request.method = %method,
        http.route = %route,
        url.path = %path,
        http.response.status_code = Empty,
    );
    span.set_parent(extract_context(req.headers()));

    let start = Instant::now();
    let response = next.run(req).instrument(span.clone()).await;
    let elapsed = start.elapsed();

    let status = response.status().as_u16();
    span.record("http.response.status_code", status);
    if response.status().is_server_error() {
        span.record("otel.status_code", "ERROR");
    }

    metrics.record_server_request(&method, &route, status, elapsed);

    let duration_ms = duration_ms(elapsed);
    span.in_scope(|| match status {
        500.. => tracing::error!(method, path, status, duration_ms, "request"),
        400..=499 => tracing::warn!(method, path, status, duration_ms, "request"),
        _ => tracing::info!(method, path, status, duration_ms, "request"),
    });

    response
}

fn route_label(matched: Option<&str>) -> String {
    matched.unwrap_or(UNMATCHED_ROUTE).to_string()
}

fn duration_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
