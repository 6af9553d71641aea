//! Configuration parsing for the frontend server.
//!
//! Supports:
//! - CLI arguments via clap
//! - Environment variable overrides
//! - Defaults matching the fixed deployment (port 3000, backend on 8080,
//!   collector on 4317)
//!
//! [`Config`] configures the `frontend` binary, [`BackendConfig`] the
//! companion `backend` binary.

use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};
use std::time::Duration;

/// Frontend: forwards requests to a backend service with OTLP telemetry.
#[derive(Parser, Debug, Clone)]
#[command(name = "frontend")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Host address to bind to
    #[arg(long, env = "FRONTEND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "FRONTEND_PORT", default_value_t = 3000)]
    pub port: u16,

    /// URL called once per inbound request
    #[arg(
        long,
        env = "FRONTEND_BACKEND_URL",
        default_value = "http://localhost:8080/data"
    )]
    pub backend_url: String,

    /// Timeout for the whole backend call, in milliseconds
    #[arg(long, env = "FRONTEND_BACKEND_TIMEOUT_MS", default_value_t = 10_000)]
    pub backend_timeout_ms: u64,

    /// OpenTelemetry collector endpoint (OTLP/gRPC)
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_endpoint: String,

    /// Metric export interval, in milliseconds
    #[arg(long, env = "FRONTEND_METRICS_INTERVAL_MS", default_value_t = 1000)]
    pub metrics_interval_ms: u64,

    /// Service name reported in telemetry resources
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "frontend-service")]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "FRONTEND_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Backend: serves `/work`, failing a configurable share of jobs.
#[derive(Parser, Debug, Clone)]
#[command(name = "backend")]
#[command(author, version, about, long_about = None)]
pub struct BackendConfig {
    /// Host address to bind to
    #[arg(long, env = "BACKEND_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "BACKEND_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Share of `/work` jobs that fail, between 0 and 1
    #[arg(
        long,
        env = "BACKEND_FAILURE_RATE",
        default_value_t = 0.2,
        value_parser = parse_failure_rate
    )]
    pub failure_rate: f64,

    /// OpenTelemetry collector endpoint (OTLP/gRPC)
    #[arg(
        long,
        env = "OTEL_EXPORTER_OTLP_ENDPOINT",
        default_value = "http://localhost:4317"
    )]
    pub otel_endpoint: String,

    /// Metric export interval, in milliseconds
    #[arg(long, env = "BACKEND_METRICS_INTERVAL_MS", default_value_t = 5000)]
    pub metrics_interval_ms: u64,

    /// Service name reported in telemetry resources
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "backend-service")]
    pub service_name: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "BACKEND_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl BackendConfig {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        clap_defaults()
    }
}

/// Parse a probability in `[0, 1]`.
pub fn parse_failure_rate(s: &str) -> Result<f64, String> {
    let rate: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("{rate} is not between 0 and 1"))
    }
}

/// Console log output format.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl Config {
    /// Parse configuration from CLI arguments and environment.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_millis(self.backend_timeout_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }

    /// Configuration for tests: random local port, short timeout.
    pub fn test_config(backend_url: impl Into<String>) -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0, // Random port
            backend_url: backend_url.into(),
            backend_timeout_ms: 1_000,
            otel_endpoint: "http://127.0.0.1:4317".into(),
            metrics_interval_ms: 100,
            service_name: "frontend-test".into(),
            log_level: "debug".into(),
            log_format: LogFormat::Text,
        }
    }
}

impl Default for Config {
    /// The flag defaults, ignoring the environment.
    fn default() -> Self {
        clap_defaults()
    }
}

/// Parse an empty command line for `T` with every env fallback removed.
pub(crate) fn clap_defaults<T: Parser>() -> T {
    let matches = T::command()
        .mut_args(|arg| arg.env(None::<&str>))
        .get_matches_from([T::command().get_name().to_string()]);
    T::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}
