//! Telemetry bootstrap.
//!
//! [`Telemetry::start`] builds the OTLP/gRPC trace and metric pipelines once at
//! startup. Nothing is registered globally: the tracer is handed to the
//! subscriber and the instruments to the router, and [`Telemetry::shutdown`]
//! flushes both pipelines on exit.

use std::time::Duration;

use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{Protocol, WithExportConfig};
use opentelemetry_sdk::metrics::{ManualReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{Tracer, TracerProvider};
use opentelemetry_sdk::{runtime, Resource};

use crate::config::{BackendConfig, Config};
use crate::error::TelemetryError;
use crate::observability::metrics::HttpMetrics;

/// Instrumentation scope name for spans and instruments.
const SCOPE: &str = "frontend";

/// Where and how often telemetry is exported.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// OTLP/gRPC collector endpoint, e.g. `http://localhost:4317`.
    pub endpoint: String,
    /// Value of the `service.name` resource attribute.
    pub service_name: String,
    /// Period of the metric reader.
    pub metrics_interval: Duration,
}

impl From<&Config> for TelemetryConfig {
    fn from(config: &Config) -> Self {
        Self {
            endpoint: config.otel_endpoint.clone(),
            service_name: config.service_name.clone(),
            metrics_interval: config.metrics_interval(),
        }
    }
}

impl From<&BackendConfig> for TelemetryConfig {
    fn from(config: &BackendConfig) -> Self {
        Self {
            endpoint: config.otel_endpoint.clone(),
            service_name: config.service_name.clone(),
            metrics_interval: config.metrics_interval(),
        }
    }
}

/// Process telemetry: tracer provider, meter provider and HTTP instruments.
pub struct Telemetry {
    tracer_provider: TracerProvider,
    meter_provider: SdkMeterProvider,
    metrics: HttpMetrics,
}

impl Telemetry {
    /// Start OTLP export of spans (batched) and metrics (periodic).
    ///
    /// Must be called from within a Tokio runtime: the batch span processor
    /// and the periodic reader run as Tokio tasks.
    pub fn start(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let resource = service_resource(&config.service_name);

        let tracer_provider = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(config.endpoint.clone())
                    .with_protocol(Protocol::Grpc),
            )
            .with_trace_config(
                opentelemetry_sdk::trace::Config::default().with_resource(resource.clone()),
            )
            .install_batch(runtime::Tokio)?;

        let meter_provider = opentelemetry_otlp::new_pipeline()
            .metrics(runtime::Tokio)
            .with_exporter(
                opentelemetry_otlp::new_exporter()
                    .tonic()
                    .with_endpoint(config.endpoint.clone())
                    .with_protocol(Protocol::Grpc),
            )
            .with_resource(resource)
            .with_period(config.metrics_interval)
            .build()?;

        Ok(Self::from_providers(tracer_provider, meter_provider))
    }

    /// Telemetry that records spans and metrics but exports nothing.
    pub fn local() -> Self {
        let tracer_provider = TracerProvider::builder().build();
        let reader = ManualReader::builder().build();
        let meter_provider = SdkMeterProvider::builder().with_reader(reader).build();
        Self::from_providers(tracer_provider, meter_provider)
    }

    fn from_providers(tracer_provider: TracerProvider, meter_provider: SdkMeterProvider) -> Self {
        let meter = meter_provider.meter(SCOPE);
        let metrics = HttpMetrics::new(&meter);
        Self {
            tracer_provider,
            meter_provider,
            metrics,
        }
    }

    /// Tracer to plug into the `tracing` subscriber.
    pub fn tracer(&self) -> Tracer {
        self.tracer_provider.tracer(SCOPE)
    }

    /// Meter for instruments outside [`HttpMetrics`].
    pub fn meter(&self, scope: &'static str) -> Meter {
        self.meter_provider.meter(scope)
    }

    /// HTTP instruments, cheap to clone.
    pub fn metrics(&self) -> HttpMetrics {
        self.metrics.clone()
    }

    /// Flush pending spans and metrics, then stop both pipelines.
    ///
    /// Blocks until the exporters finish; call it from a blocking context
    /// (e.g. `spawn_blocking`) when running on a Tokio runtime.
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        let traces = self.tracer_provider.shutdown();
        let metrics = self.meter_provider.shutdown();
        traces?;
        metrics?;
        Ok(())
    }
}

fn service_resource(service_name: &str) -> Resource {
    Resource::new([
        KeyValue::new("service.name", service_name.to_string()),
        KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
    ])
}
