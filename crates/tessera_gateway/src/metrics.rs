//! Metrics for gateway dispatch.
//!
//! OpenTelemetry instruments for request outcomes, retries and failover
//! hops, labelled by backend and model.

use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram, Meter},
};
use std::sync::OnceLock;

static METRICS: OnceLock<GatewayMetrics> = OnceLock::new();

/// Gateway dispatch metrics.
#[derive(Clone)]
pub struct GatewayMetrics {
    /// Meter handle kept alive for metric instruments
    _meter: Meter,
    /// Successful upstream calls
    pub requests: Counter<u64>,
    /// Failed upstream calls, labelled by error kind
    pub errors: Counter<u64>,
    /// Attempts beyond the first against the same backend
    pub retries: Counter<u64>,
    /// Requests re-routed to the fallback backend
    pub failovers: Counter<u64>,
    /// Call duration in seconds, retries included
    pub duration: Histogram<f64>,
}

impl GatewayMetrics {
    fn init() -> Self {
        let meter = global::meter("tessera_gateway");

        Self {
            _meter: meter.clone(),
            requests: meter
                .u64_counter("gateway.requests")
                .with_description("Successful upstream calls")
                .build(),
            errors: meter
                .u64_counter("gateway.errors")
                .with_description("Failed upstream calls")
                .build(),
            retries: meter
                .u64_counter("gateway.retries")
                .with_description("Retried upstream attempts")
                .build(),
            failovers: meter
                .u64_counter("gateway.failovers")
                .with_description("Requests re-routed to the fallback backend")
                .build(),
            duration: meter
                .f64_histogram("gateway.duration")
                .with_unit("seconds")
                .with_description("Upstream call duration")
                .build(),
        }
    }

    /// Get the global gateway metrics instance.
    pub fn get() -> &'static Self {
        METRICS.get_or_init(Self::init)
    }

    /// Record a successful call.
    pub fn record_request(&self, backend: &str, model: &str, duration_secs: f64) {
        let labels = &[
            KeyValue::new("backend", backend.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.requests.add(1, labels);
        self.duration.record(duration_secs, labels);
    }

    /// Record a failed call.
    pub fn record_error(&self, backend: &str, model: &str, error_kind: &'static str) {
        let labels = &[
            KeyValue::new("backend", backend.to_string()),
            KeyValue::new("model", model.to_string()),
            KeyValue::new("error_kind", error_kind),
        ];
        self.errors.add(1, labels);
    }

    /// Record a retry against the same backend.
    pub fn record_retry(&self, backend: &str, model: &str) {
        let labels = &[
            KeyValue::new("backend", backend.to_string()),
            KeyValue::new("model", model.to_string()),
        ];
        self.retries.add(1, labels);
    }

    /// Record a failover hop.
    pub fn record_failover(&self, from: &str, to: &str) {
        let labels = &[
            KeyValue::new("from", from.to_string()),
            KeyValue::new("to", to.to_string()),
        ];
        self.failovers.add(1, labels);
    }
}

impl Default for GatewayMetrics {
    fn default() -> Self {
        Self::get().clone()
    }
}
