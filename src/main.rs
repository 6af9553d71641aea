//! Frontend: forwards `GET /` to a backend service and reports traces and
//! metrics over OTLP.
//!
//! # Usage
//!
//! ```bash
//! frontend --port 3000 --backend-url http://localhost:8080/data
//! ```
//!
//! Environment variables can also be used:
//! - `FRONTEND_PORT`: Port to listen on
//! - `FRONTEND_BACKEND_URL`: Backend URL called per request
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP/gRPC collector endpoint
//! - `RUST_LOG`: Log level (trace, debug, info, warn, error)

use std::sync::Arc;

use anyhow::Context as _;
use frontend::config::Config;
use frontend::observability::tracing::init_tracing;
use frontend::observability::{Telemetry, TelemetryConfig};
use frontend::server::{run_server, shutdown_signal, AppState};

/// Print startup banner with version and configuration.
fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        r#"
  Frontend v{}

  Configuration:
    Address:    {}:{}
    Backend:    {} (timeout {} ms)
    Collector:  {} (metrics every {} ms)
    Log Level:  {}

  Press Ctrl+C to shutdown gracefully.
"#,
        version,
        config.host,
        config.port,
        config.backend_url,
        config.backend_timeout_ms,
        config.otel_endpoint,
        config.metrics_interval_ms,
        config.log_level
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse configuration from CLI arguments and environment
    let config = Config::parse_args();

    // Telemetry comes up before anything can serve a request
    let telemetry = Telemetry::start(&TelemetryConfig::from(&config))
        .context("failed to start telemetry")?;
    init_tracing(&config.log_level, config.log_format, telemetry.tracer())
        .context("failed to initialize tracing")?;
    tracing::info!(
        endpoint = %config.otel_endpoint,
        service = %config.service_name,
        "OTLP trace and metric export started"
    );

    print_banner(&config);

    let state = Arc::new(AppState::from_config(&config, telemetry.metrics())?);

    let shutdown_rx = shutdown_signal();

    let result = run_server(&config, state, telemetry.metrics(), shutdown_rx).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "server error");
    }

    // Exporters block while flushing
    tracing::info!("Flushing telemetry");
    tokio::task::spawn_blocking(move || telemetry.shutdown())
        .await
        .context("telemetry shutdown task panicked")?
        .context("failed to shut down telemetry")?;

    result
}
