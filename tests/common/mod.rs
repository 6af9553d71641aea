//! Test utilities and server harness for frontend tests.
//!
//! Provides:
//! - A scripted mock backend that counts calls and records `traceparent`
//! - An in-process frontend server
//! - A fake OTLP/gRPC collector recording exported spans and metrics

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use frontend::config::Config;
use frontend::observability::tracing::init_test_tracing;
use frontend::observability::Telemetry;
use frontend::server::{build_router, serve, AppState};
use opentelemetry_proto::tonic::collector::metrics::v1::metrics_service_server::{
    MetricsService, MetricsServiceServer,
};
use opentelemetry_proto::tonic::collector::metrics::v1::{
    ExportMetricsServiceRequest, ExportMetricsServiceResponse,
};
use opentelemetry_proto::tonic::collector::trace::v1::trace_service_server::{
    TraceService, TraceServiceServer,
};
use opentelemetry_proto::tonic::collector::trace::v1::{
    ExportTraceServiceRequest, ExportTraceServiceResponse,
};
use opentelemetry_proto::tonic::trace::v1::Span;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::TcpListenerStream;

/// What the mock backend answers on `GET /data`.
#[derive(Clone)]
pub enum Behavior {
    /// Respond with a JSON body and status.
    Json(StatusCode, Value),
    /// Respond with a raw text body and status.
    Text(StatusCode, &'static str),
    /// Sleep, then respond 200 with the JSON body.
    Delay(Duration, Value),
    /// Respond `302 Found` pointing at `/data2`, which serves the JSON body.
    Redirect(Value),
}

struct MockState {
    behavior: Behavior,
    hits: AtomicUsize,
    redirected_hits: AtomicUsize,
    traceparents: Mutex<Vec<String>>,
}

/// Mock backend listening on a random local port.
pub struct MockBackend {
    pub addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: watch::Sender<bool>,
}

impl MockBackend {
    pub async fn start(behavior: Behavior) -> Self {
        let state = Arc::new(MockState {
            behavior,
            hits: AtomicUsize::new(0),
            redirected_hits: AtomicUsize::new(0),
            traceparents: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/data", get(mock_data))
            .route("/data2", get(mock_redirect_target))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind mock backend");
        let addr = listener.local_addr().expect("no local addr");
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.changed().await;
                })
                .await
                .expect("mock backend failed");
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    /// URL the frontend should call.
    pub fn url(&self) -> String {
        format!("http://{}/data", self.addr)
    }

    /// Number of requests received on `/data` so far.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Number of requests received on the redirect target `/data2`.
    pub fn redirected_hits(&self) -> usize {
        self.state.redirected_hits.load(Ordering::SeqCst)
    }

    /// `traceparent` headers received so far.
    pub fn traceparents(&self) -> Vec<String> {
        self.state.traceparents.lock().unwrap().clone()
    }

    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }
}

async fn mock_data(State(state): State<Arc<MockState>>, headers: HeaderMap) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    if let Some(traceparent) = headers.get("traceparent").and_then(|v| v.to_str().ok()) {
        state
            .traceparents
            .lock()
            .unwrap()
            .push(traceparent.to_string());
    }

    match &state.behavior {
        Behavior::Json(status, body) => (*status, Json(body.clone())).into_response(),
        Behavior::Text(status, body) => (*status, *body).into_response(),
        Behavior::Delay(delay, body) => {
            tokio::time::sleep(*delay).await;
            Json(body.clone()).into_response()
        }
        Behavior::Redirect(_) => {
            (StatusCode::FOUND, [(header::LOCATION, "/data2")]).into_response()
        }
    }
}

async fn mock_redirect_target(State(state): State<Arc<MockState>>) -> Response {
    state.redirected_hits.fetch_add(1, Ordering::SeqCst);
    match &state.behavior {
        Behavior::Redirect(body) => Json(body.clone()).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Port on which nothing is listening.
pub fn refused_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let addr = listener.local_addr().expect("no local addr");
    drop(listener);
    format!("http://{addr}/data")
}

/// In-process frontend server on a random local port.
pub struct TestServer {
    pub addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<std::io::Result<()>>,
    _telemetry: Telemetry,
}

impl TestServer {
    /// Start a frontend calling `backend_url` with a 1 s backend timeout.
    pub async fn start(backend_url: &str) -> Self {
        Self::start_with_config(Config::test_config(backend_url)).await
    }

    pub async fn start_with_config(config: Config) -> Self {
        init_test_tracing();
        let telemetry = Telemetry::local();
        let metrics = telemetry.metrics();
        let state = Arc::new(
            AppState::from_config(&config, metrics.clone()).expect("failed to build state"),
        );
        let router = build_router(state, metrics);

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind frontend");
        let addr = listener.local_addr().expect("no local addr");
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(serve(listener, router, shutdown_rx));

        Self {
            addr,
            shutdown_tx,
            handle,
            _telemetry: telemetry,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Stop the server and wait for it to drain.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        self.handle
            .await
            .expect("server task panicked")
            .expect("server failed");
    }
}

/// Fake OTLP/gRPC collector storing every export request it receives.
#[derive(Clone, Default)]
pub struct FakeCollector {
    traces: Arc<Mutex<Vec<ExportTraceServiceRequest>>>,
    metrics: Arc<Mutex<Vec<ExportMetricsServiceRequest>>>,
}

impl FakeCollector {
    /// Start the collector; returns it with its `http://` endpoint.
    pub async fn start() -> (Self, String) {
        let collector = Self::default();
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind collector");
        let addr = listener.local_addr().expect("no local addr");

        let server = tonic::transport::Server::builder()
            .add_service(TraceServiceServer::new(collector.clone()))
            .add_service(MetricsServiceServer::new(collector.clone()))
            .serve_with_incoming(TcpListenerStream::new(listener));
        tokio::spawn(async move {
            server.await.expect("collector failed");
        });

        (collector, format!("http://{addr}"))
    }

    /// Every span received, across all export requests.
    pub fn spans(&self) -> Vec<Span> {
        self.traces
            .lock()
            .unwrap()
            .iter()
            .flat_map(|req| req.resource_spans.iter())
            .flat_map(|rs| rs.scope_spans.iter())
            .flat_map(|ss| ss.spans.iter().cloned())
            .collect()
    }

    /// `service.name` values of every received span resource.
    pub fn span_service_names(&self) -> Vec<String> {
        use opentelemetry_proto::tonic::common::v1::any_value::Value as AnyValue;

        self.traces
            .lock()
            .unwrap()
            .iter()
            .flat_map(|req| req.resource_spans.iter())
            .filter_map(|rs| rs.resource.as_ref())
            .flat_map(|r| r.attributes.iter())
            .filter(|kv| kv.key == "service.name")
            .filter_map(|kv| match kv.value.as_ref()?.value.as_ref()? {
                AnyValue::StringValue(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// String values of attribute `key` on the data points of histogram
    /// `metric`, across all export requests.
    pub fn histogram_attribute(&self, metric: &str, key: &str) -> Vec<String> {
        use opentelemetry_proto::tonic::common::v1::any_value::Value as AnyValue;
        use opentelemetry_proto::tonic::metrics::v1::metric::Data;

        self.metrics
            .lock()
            .unwrap()
            .iter()
            .flat_map(|req| req.resource_metrics.iter())
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .filter(|m| m.name == metric)
            .filter_map(|m| match m.data.as_ref()? {
                Data::Histogram(histogram) => Some(histogram.data_points.iter()),
                _ => None,
            })
            .flatten()
            .flat_map(|point| point.attributes.iter())
            .filter(|kv| kv.key == key)
            .filter_map(|kv| match kv.value.as_ref()?.value.as_ref()? {
                AnyValue::StringValue(s) => Some(s.clone()),
                _ => None,
            })
            .collect()
    }

    /// Latest integer value of sum metric `metric`, summed over its data
    /// points.
    pub fn counter_value(&self, metric: &str) -> Option<i64> {
        use opentelemetry_proto::tonic::metrics::v1::metric::Data;
        use opentelemetry_proto::tonic::metrics::v1::number_data_point::Value as Number;

        self.metrics
            .lock()
            .unwrap()
            .iter()
            .flat_map(|req| req.resource_metrics.iter())
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter())
            .filter(|m| m.name == metric)
            .filter_map(|m| match m.data.as_ref()? {
                Data::Sum(sum) => Some(
                    sum.data_points
                        .iter()
                        .filter_map(|p| match p.value.as_ref()? {
                            Number::AsInt(v) => Some(*v),
                            Number::AsDouble(_) => None,
                        })
                        .sum::<i64>(),
                ),
                _ => None,
            })
            .last()
    }

    /// Names of every metric received.
    pub fn metric_names(&self) -> Vec<String> {
        self.metrics
            .lock()
            .unwrap()
            .iter()
            .flat_map(|req| req.resource_metrics.iter())
            .flat_map(|rm| rm.scope_metrics.iter())
            .flat_map(|sm| sm.metrics.iter().map(|m| m.name.clone()))
            .collect()
    }
}

#[tonic::async_trait]
impl TraceService for FakeCollector {
    async fn export(
        &self,
        request: tonic::Request<ExportTraceServiceRequest>,
    ) -> Result<tonic::Response<ExportTraceServiceResponse>, tonic::Status> {
        self.traces.lock().unwrap().push(request.into_inner());
        Ok(tonic::Response::new(ExportTraceServiceResponse {
            partial_success: None,
        }))
    }
}

#[tonic::async_trait]
impl MetricsService for FakeCollector {
    async fn export(
        &self,
        request: tonic::Request<ExportMetricsServiceRequest>,
    ) -> Result<tonic::Response<ExportMetricsServiceResponse>, tonic::Status> {
        self.metrics.lock().unwrap().push(request.into_inner());
        Ok(tonic::Response::new(ExportMetricsServiceResponse {
            partial_success: None,
        }))
    }
}

/// Lowercase hex rendering of a span or trace id.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Wait for a condition to become true with timeout.
///
/// # Returns
///
/// `true` if condition was met, `false` if timeout expired
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
