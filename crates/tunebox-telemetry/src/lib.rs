//! Process-wide logging and tracing setup.
//!
//! [`init`] installs a `tracing` subscriber made of an [`EnvFilter`], a
//! console formatter and, when an OTLP endpoint is configured, an
//! OpenTelemetry layer that exports spans over gRPC. Records emitted through
//! the `log` facade are bridged into `tracing`.

use std::fmt;
use std::str::FromStr;

use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{SpanExporter, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt as console, EnvFilter, Layer, Registry};
use typed_builder::TypedBuilder;

pub const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("failed to build OTLP exporter: {0}")]
    Exporter(#[from] opentelemetry_otlp::ExporterBuildError),
    #[error("a global subscriber is already installed")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
    #[error("failed to bridge `log` records: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),
}

/// Console output style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human oriented.
    Pretty,
    #[default]
    Compact,
    /// One JSON object per line.
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Compact => "compact",
            LogFormat::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown log format `{0}`, expected one of: pretty, compact, json")]
pub struct ParseLogFormatError(String);

impl FromStr for LogFormat {
    type Err = ParseLogFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            _ => Err(ParseLogFormatError(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct TelemetryConfig {
    /// Reported as `service.name` on exported spans.
    #[builder(setter(into))]
    pub service_name: String,
    #[builder(default)]
    pub log_format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    #[builder(default = DEFAULT_DIRECTIVE.to_string(), setter(into))]
    pub default_directive: String,
    /// gRPC collector endpoint, e.g. `http://localhost:4317`.
    #[builder(default, setter(into))]
    pub otlp_endpoint: Option<String>,
}

/// Keeps the span exporter alive; flushes and shuts it down on drop.
#[must_use = "dropping the guard stops span export"]
#[derive(Debug)]
pub struct TelemetryGuard {
    provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are exported to a collector.
    pub fn is_exporting(&self) -> bool {
        self.provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.provider.take() {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to flush pending spans");
            }
        }
    }
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => Ok(EnvFilter::try_new(&config.default_directive)?),
    }
}

fn console_layer(format: LogFormat) -> BoxedLayer {
    match format {
        LogFormat::Pretty => console::layer().pretty().boxed(),
        LogFormat::Compact => console::layer().compact().boxed(),
        LogFormat::Json => console::layer().json().flatten_event(true).boxed(),
    }
}

fn tracer_provider(
    service_name: &str,
    endpoint: &str,
) -> Result<SdkTracerProvider, TelemetryError> {
    let exporter = SpanExporter::builder()
        .with_tonic()
        .with_endpoint(endpoint)
        .build()?;

    let resource = Resource::builder()
        .with_service_name(service_name.to_string())
        .build();

    Ok(SdkTracerProvider::builder()
        .with_batch_exporter(exporter)
        .with_resource(resource)
        .build())
}

/// Installs the global subscriber.
///
/// Fails with [`TelemetryError::AlreadyInitialized`] when called twice in
/// the same process.
pub fn init(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let mut layers: Vec<BoxedLayer> = vec![
        filter(&config)?.boxed(),
        console_layer(config.log_format),
    ];

    let provider = match config.otlp_endpoint.as_deref() {
        Some(endpoint) => {
            let provider = tracer_provider(&config.service_name, endpoint)?;
            let tracer = provider.tracer(config.service_name.clone());
            layers.push(tracing_opentelemetry::layer().with_tracer(tracer).boxed());
            Some(provider)
        }
        None => None,
    };

    tracing::subscriber::set_global_default(Registry::default().with(layers))?;
    tracing_log::LogTracer::init()?;

    tracing::info!(
        service = %config.service_name,
        format = %config.log_format,
        otlp_endpoint = ?config.otlp_endpoint,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard { provider })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_log_formats_case_insensitively() {
        assert_eq!("pretty".parse::<LogFormat>().unwrap(), LogFormat::Pretty);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("Compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);

        let err = "xml".parse::<LogFormat>().unwrap_err();
        assert!(err.to_string().contains("xml"));
    }

    #[test]
    fn display_round_trips_through_from_str() {
        for format in [LogFormat::Pretty, LogFormat::Compact, LogFormat::Json] {
            assert_eq!(format.to_string().parse::<LogFormat>().unwrap(), format);
        }
    }

    #[test]
    fn config_defaults() {
        let config = TelemetryConfig::builder().service_name("tunebox").build();
        assert_eq!(config.service_name, "tunebox");
        assert_eq!(config.log_format, LogFormat::Compact);
        assert_eq!(config.default_directive, DEFAULT_DIRECTIVE);
        assert!(config.otlp_endpoint.is_none());

        let config = TelemetryConfig::builder()
            .service_name("tunebox")
            .otlp_endpoint("http://localhost:4317".to_string())
            .build();
        assert_eq!(config.otlp_endpoint.as_deref(), Some("http://localhost:4317"));
    }

    #[test]
    fn rejects_malformed_default_directive() {
        let config = TelemetryConfig::builder()
            .service_name("tunebox")
            .default_directive("tunebox=notalevel")
            .build();
        if std::env::var_os("RUST_LOG").is_none() {
            assert!(matches!(filter(&config), Err(TelemetryError::Filter(_))));
        }
    }
}
