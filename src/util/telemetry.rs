//! Log subscriber setup.
//!
//! Logs go to stderr through `tracing-subscriber`, filtered by `RUST_LOG` (default `info`),
//! so that command output on stdout stays machine-readable. With the `telemetry` feature
//! and any `OTEL_EXPORTER_OTLP_*` variable set, spans are additionally exported over OTLP.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[cfg(feature = "telemetry")]
use opentelemetry::{KeyValue, trace::TracerProvider as _};
#[cfg(feature = "telemetry")]
use opentelemetry_sdk::{
    Resource,
    trace::{RandomIdGenerator, Sampler, SdkTracerProvider},
};
#[cfg(feature = "telemetry")]
use opentelemetry_semantic_conventions::{
    SCHEMA_URL,
    attribute::{DEPLOYMENT_ENVIRONMENT_NAME, SERVICE_VERSION},
};

const DEFAULT_FILTER: &str = "info";

/// Telemetry protocol to use for OTLP export
#[cfg(feature = "telemetry")]
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TelemetryProtocol {
    HTTP,
    GRPC,
}

#[cfg(feature = "telemetry")]
impl TelemetryProtocol {
    /// Determines telemetry protocol from environment variables if OTEL is configured
    fn from_env() -> Option<Self> {
        let is_enabled = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok()
            || std::env::var("OTEL_EXPORTER_OTLP_HEADERS").is_ok()
            || std::env::var("OTEL_EXPORTER_OTLP_PROTOCOL").is_ok();
        if !is_enabled {
            return None;
        }
        let protocol = match std::env::var("OTEL_EXPORTER_OTLP_PROTOCOL").as_deref() {
            Ok("grpc") => TelemetryProtocol::GRPC,
            _ => TelemetryProtocol::HTTP,
        };
        Some(protocol)
    }
}

/// Installs the global subscriber and keeps exporters alive until dropped.
pub struct Telemetry {
    name: &'static str,
    version: &'static str,
    #[cfg(feature = "telemetry")]
    tracer_provider: Option<SdkTracerProvider>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new()
    }
}

impl Telemetry {
    pub fn new() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            #[cfg(feature = "telemetry")]
            tracer_provider: None,
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }

    pub fn with_version(mut self, version: &'static str) -> Self {
        self.version = version;
        self
    }

    fn env_filter() -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    }

    /// Registers the global subscriber. Calling it twice keeps the first subscriber.
    #[cfg(not(feature = "telemetry"))]
    pub fn register(self) -> Self {
        let _ = tracing_subscriber::registry()
            .with(Self::env_filter())
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init();
        tracing::debug!(name = self.name, version = self.version, "Logging initialized");
        self
    }

    /// Registers the global subscriber, with an OTLP span exporter when configured.
    #[cfg(feature = "telemetry")]
    pub fn register(mut self) -> Self {
        let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
        match TelemetryProtocol::from_env() {
            Some(protocol) => match self.tracer_provider(protocol) {
                Ok(tracer_provider) => {
                    let tracer = tracer_provider.tracer(self.name);
                    let _ = tracing_subscriber::registry()
                        .with(Self::env_filter())
                        .with(fmt_layer)
                        .with(tracing_opentelemetry::OpenTelemetryLayer::new(tracer))
                        .try_init();
                    tracing::debug!(?protocol, "OpenTelemetry span export is enabled");
                    self.tracer_provider = Some(tracer_provider);
                }
                Err(e) => {
                    let _ = tracing_subscriber::registry()
                        .with(Self::env_filter())
                        .with(fmt_layer)
                        .try_init();
                    tracing::warn!(error = %e, "Failed to build OTLP span exporter");
                }
            },
            None => {
                let _ = tracing_subscriber::registry()
                    .with(Self::env_filter())
                    .with(fmt_layer)
                    .try_init();
            }
        }
        self
    }

    #[cfg(feature = "telemetry")]
    fn resource(&self) -> Resource {
        let deployment_env =
            std::env::var("DEPLOYMENT_ENV").unwrap_or_else(|_| "develop".to_string());
        Resource::builder()
            .with_service_name(self.name)
            .with_schema_url(
                [
                    KeyValue::new(SERVICE_VERSION, self.version),
                    KeyValue::new(DEPLOYMENT_ENVIRONMENT_NAME, deployment_env),
                ],
                SCHEMA_URL,
            )
            .build()
    }

    #[cfg(feature = "telemetry")]
    fn tracer_provider(
        &self,
        protocol: TelemetryProtocol,
    ) -> Result<SdkTracerProvider, opentelemetry_otlp::ExporterBuildError> {
        use opentelemetry_otlp::WithExportConfig as _;

        let exporter = opentelemetry_otlp::SpanExporter::builder();
        let exporter = match protocol {
            TelemetryProtocol::HTTP => exporter
                .with_http()
                .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
                .build(),
            TelemetryProtocol::GRPC => exporter.with_tonic().build(),
        }?;
        Ok(SdkTracerProvider::builder()
            .with_sampler(Sampler::ParentBased(Box::new(Sampler::AlwaysOn)))
            .with_id_generator(RandomIdGenerator::default())
            .with_resource(self.resource())
            .with_batch_exporter(exporter)
            .build())
    }
}

#[cfg(feature = "telemetry")]
impl Drop for Telemetry {
    fn drop(&mut self) {
        if let Some(tracer_provider) = self.tracer_provider.take() {
            if let Err(err) = tracer_provider.shutdown() {
                eprintln!("{err:?}");
            }
        }
    }
}
