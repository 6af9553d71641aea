//! Backend: serves `GET /work`, a business job that fails a configurable
//! share of the time, and reports traces and metrics over OTLP.
//!
//! # Usage
//!
//! ```bash
//! backend --port 8080 --failure-rate 0.2
//! ```
//!
//! Environment variables can also be used:
//! - `BACKEND_PORT`: Port to listen on
//! - `BACKEND_FAILURE_RATE`: Share of jobs that fail
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP/gRPC collector endpoint
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use std::sync::Arc;

use anyhow::Context as _;
use frontend::config::BackendConfig;
use frontend::observability::tracing::init_tracing;
use frontend::observability::{JobMetrics, Telemetry, TelemetryConfig};
use frontend::server::{bind, build_work_router, serve, shutdown_signal};
use frontend::service::WorkState;

/// Instrumentation scope of the business counter.
const JOBS_SCOPE: &str = "backend-operations";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = BackendConfig::parse_args();

    let telemetry = Telemetry::start(&TelemetryConfig::from(&config))
        .context("failed to start telemetry")?;
    init_tracing(&config.log_level, config.log_format, telemetry.tracer())
        .context("failed to initialize tracing")?;

    let jobs = JobMetrics::new(&telemetry.meter(JOBS_SCOPE));
    let state = Arc::new(WorkState::new(config.failure_rate, jobs)?);

    let listener = bind(&config.host, config.port).await?;
    tracing::info!(
        port = config.port,
        failure_rate = state.failure_rate(),
        "Backend active, test the job route at /work"
    );

    let router = build_work_router(state, telemetry.metrics());
    let result = serve(listener, router, shutdown_signal())
        .await
        .context("server error");
    if let Err(e) = &result {
        tracing::error!(error = %e, "server error");
    }

    tracing::info!("Flushing telemetry");
    tokio::task::spawn_blocking(move || telemetry.shutdown())
        .await
        .context("telemetry shutdown task panicked")?
        .context("failed to shut down telemetry")?;

    result
}
