//! # Prometheus Metrics
//!
//! Operational metrics for a scenario run: how many entry calls were made,
//! how many failed, how many events the ledger recorded, and how long each
//! kind of call took. Dumped in the Prometheus text format with `--metrics`.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] so they
//! do not collide with any default global registry consumers.

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;

/// Holds all Prometheus metric handles for a run.
///
/// Clone-friendly: prometheus handles are reference-counted internally.
#[derive(Clone)]
pub struct RunMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Entry calls executed, by operation.
    pub operations_total: IntCounterVec,
    /// Entry calls that returned an error, by operation.
    pub operations_failed_total: IntCounterVec,
    /// Events appended to the ledger log.
    pub events_emitted_total: IntCounter,
    /// Per-operation latency in seconds.
    pub operation_latency_seconds: HistogramVec,
}

impl RunMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("strongbox".into()), None)
            .expect("failed to create prometheus registry");

        let operations_total = IntCounterVec::new(
            Opts::new("operations_total", "Total number of entry calls executed"),
            &["op"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_total.clone()))
            .expect("metric registration");

        let operations_failed_total = IntCounterVec::new(
            Opts::new(
                "operations_failed_total",
                "Total number of entry calls that were rejected",
            ),
            &["op"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(operations_failed_total.clone()))
            .expect("metric registration");

        let events_emitted_total = IntCounter::new(
            "events_emitted_total",
            "Total number of events appended to the ledger log",
        )
        .expect("metric creation");
        registry
            .register(Box::new(events_emitted_total.clone()))
            .expect("metric registration");

        let operation_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "operation_latency_seconds",
                "Entry call latency in seconds",
            )
            .buckets(vec![
                0.000_01, 0.000_05, 0.000_1, 0.000_5, 0.001, 0.005, 0.01, 0.05, 0.1,
            ]),
            &["op"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(operation_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            operations_total,
            operations_failed_total,
            events_emitted_total,
            operation_latency_seconds,
        }
    }

    /// Records one executed entry call.
    pub fn observe(&self, op: &str, ok: bool, elapsed: Duration, new_events: u64) {
        self.operations_total.with_label_values(&[op]).inc();
        if !ok {
            self.operations_failed_total.with_label_values(&[op]).inc();
        }
        self.operation_latency_seconds
            .with_label_values(&[op])
            .observe(elapsed.as_secs_f64());
        self.events_emitted_total.inc_by(new_events);
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

impl Default for RunMetrics {
    fn default() -> Self {
        Self::new()
    }
}
