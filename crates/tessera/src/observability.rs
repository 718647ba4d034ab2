//! Tracing subscriber setup, with optional OpenTelemetry export.

use std::env;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

#[cfg(feature = "otel")]
use opentelemetry::{KeyValue, global, trace::TracerProvider};
#[cfg(feature = "otel")]
use opentelemetry_sdk::{Resource, metrics::SdkMeterProvider, trace::SdkTracerProvider};

/// Configuration for logging and telemetry.
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name for telemetry attribution
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Log level filter used when `RUST_LOG` is unset (e.g., "info", "tessera=debug")
    pub log_level: String,
    /// Emit JSON-formatted logs
    pub json_logs: bool,
}

impl ObservabilityConfig {
    /// Create a configuration for a service.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            json_logs: false,
        }
    }

    /// Set the log level.
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable JSON-formatted logs.
    pub fn with_json_logs(mut self, enabled: bool) -> Self {
        self.json_logs = enabled;
        self
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self::new(env!("CARGO_PKG_NAME"))
    }
}

/// Keeps telemetry providers alive; flushes them on [`ObservabilityGuard::shutdown`].
#[derive(Debug, Default)]
pub struct ObservabilityGuard {
    #[cfg(feature = "otel")]
    tracer_provider: Option<SdkTracerProvider>,
    #[cfg(feature = "otel")]
    meter_provider: Option<SdkMeterProvider>,
}

impl ObservabilityGuard {
    /// Flush and shut down exporters.
    pub fn shutdown(self) {
        #[cfg(feature = "otel")]
        {
            if let Some(provider) = self.tracer_provider
                && let Err(e) = provider.shutdown()
            {
                eprintln!("Failed to shut down tracer provider: {e}");
            }
            if let Some(provider) = self.meter_provider
                && let Err(e) = provider.shutdown()
            {
                eprintln!("Failed to shut down meter provider: {e}");
            }
        }
    }
}

/// Install the global tracing subscriber.
///
/// Sets up:
/// - an `EnvFilter` from `RUST_LOG`, falling back to `config.log_level`
/// - a text or JSON `fmt` layer
/// - with the `otel` feature, span and metric export to stdout, which also
///   receives the gateway's request, retry and failover metrics
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already set.
pub fn init_observability(
    config: ObservabilityConfig,
) -> Result<ObservabilityGuard, Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&config.log_level))?;

    let fmt_layer = if config.json_logs {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_level(true)
            .boxed()
    };

    #[cfg(feature = "otel")]
    {
        let resource = Resource::builder()
            .with_service_name(config.service_name.clone())
            .with_attributes(vec![KeyValue::new(
                "service.version",
                config.service_version.clone(),
            )])
            .build();

        let tracer_provider = SdkTracerProvider::builder()
            .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
            .with_resource(resource.clone())
            .build();
        global::set_tracer_provider(tracer_provider.clone());

        let meter_provider = SdkMeterProvider::builder()
            .with_periodic_exporter(opentelemetry_stdout::MetricExporter::default())
            .with_resource(resource)
            .build();
        global::set_meter_provider(meter_provider.clone());

        let tracer = tracer_provider.tracer(config.service_name.clone());
        let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .try_init()?;

        Ok(ObservabilityGuard {
            tracer_provider: Some(tracer_provider),
            meter_provider: Some(meter_provider),
        })
    }

    #[cfg(not(feature = "otel"))]
    {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;
        tracing::debug!(
            service = %config.service_name,
            version = %config.service_version,
            "Logging initialized"
        );
        Ok(ObservabilityGuard::default())
    }
}
