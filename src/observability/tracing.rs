//! Logging and span export setup.
//!
//! Configures structured logging with:
//! - Text or JSON console output
//! - Level filtering from the configured directive (`RUST_LOG` by default)
//! - A `tracing-opentelemetry` layer turning spans into OpenTelemetry spans
//!
//! The log directive only filters console output. Span export has its own
//! fixed filter so that `--log-level warn` still exports every request span
//! and `--log-level debug` does not export hyper/h2/tonic internals.

use opentelemetry_sdk::trace::Tracer;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::Targets;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LogFormat;
use crate::error::TelemetryError;

/// Build a subscriber that logs to stdout and exports spans through `tracer`.
///
/// Used directly with `tracing::subscriber::set_default` for scoped setups;
/// [`init_tracing`] installs it process-wide.
pub fn subscriber(
    log_level: &str,
    format: LogFormat,
    tracer: Tracer,
) -> Result<impl Subscriber + Send + Sync + 'static, TelemetryError> {
    let filter = EnvFilter::try_new(log_level)?;

    let fmt_layer = match format {
        LogFormat::Text => tracing_subscriber::fmt::layer().with_target(true).boxed(),
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .boxed(),
    };

    let otel_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(export_filter());

    Ok(tracing_subscriber::registry()
        .with(fmt_layer.with_filter(filter))
        .with(otel_layer))
}

/// Spans and events exported over OTLP: this crate's, at `INFO` and above.
pub fn export_filter() -> Targets {
    Targets::new().with_target(env!("CARGO_CRATE_NAME"), Level::INFO)
}

/// Install the process-wide subscriber.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(log_level: &str, format: LogFormat, tracer: Tracer) -> Result<(), TelemetryError> {
    subscriber(log_level, format, tracer)?.try_init()?;
    tracing::info!(log_level, ?format, "Tracing initialized");
    Ok(())
}

/// Initialize tracing for tests (only logs errors).
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("error")
        .with_test_writer()
        .try_init();
}
