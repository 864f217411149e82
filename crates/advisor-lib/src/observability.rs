//! Observability infrastructure for the resource advisor
//!
//! Provides:
//! - Prometheus metrics (collection latency, cluster size, error and recommendation counts)
//! - Structured JSON logging with tracing

use crate::collector::CollectError;
use crate::models::{Recommendation, ResourceSnapshot};
use prometheus::{
    register_histogram, register_int_counter_vec, register_int_gauge, Histogram, IntCounterVec,
    IntGauge,
};
use std::sync::OnceLock;
use tracing::{info, warn};

/// Histogram buckets for collection latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<AdvisorMetricsInner> = OnceLock::new();

struct AdvisorMetricsInner {
    collection_latency_seconds: Histogram,
    nodes_observed: IntGauge,
    workloads_observed: IntGauge,
    collection_errors: IntCounterVec,
    recommendations_emitted: IntCounterVec,
}

impl AdvisorMetricsInner {
    fn new() -> Self {
        Self {
            collection_latency_seconds: register_histogram!(
                "resource_advisor_collection_latency_seconds",
                "Time spent collecting a resource snapshot from the cluster API",
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register collection_latency_seconds"),

            nodes_observed: register_int_gauge!(
                "resource_advisor_nodes_observed",
                "Number of nodes in the most recent snapshot"
            )
            .expect("Failed to register nodes_observed"),

            workloads_observed: register_int_gauge!(
                "resource_advisor_workloads_observed",
                "Number of workloads in the most recent snapshot"
            )
            .expect("Failed to register workloads_observed"),

            collection_errors: register_int_counter_vec!(
                "resource_advisor_collection_errors_total",
                "Failed snapshot collections by error kind",
                &["kind"]
            )
            .expect("Failed to register collection_errors"),

            recommendations_emitted: register_int_counter_vec!(
                "resource_advisor_recommendations_total",
                "Recommendations produced by resource and band",
                &["resource", "band"]
            )
            .expect("Failed to register recommendations_emitted"),
        }
    }
}

/// Handle to the process-wide advisor metrics.
///
/// Clones share the same underlying Prometheus collectors.
#[derive(Clone)]
pub struct AdvisorMetrics {
    _private: (),
}

impl Default for AdvisorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl AdvisorMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &AdvisorMetricsInner {
        GLOBAL_METRICS.get_or_init(AdvisorMetricsInner::new)
    }

    /// Record a successful collection
    pub fn record_snapshot(&self, snapshot: &ResourceSnapshot, duration_secs: f64) {
        let inner = self.inner();
        inner.collection_latency_seconds.observe(duration_secs);
        inner.nodes_observed.set(snapshot.nodes.len() as i64);
        inner.workloads_observed.set(snapshot.total_workloads() as i64);
    }

    /// Record a failed collection
    pub fn record_collection_error(&self, error: &CollectError, duration_secs: f64) {
        let inner = self.inner();
        inner.collection_latency_seconds.observe(duration_secs);
        inner
            .collection_errors
            .with_label_values(&[error.code()])
            .inc();
    }

    pub fn record_recommendations(&self, recommendations: &[Recommendation]) {
        for r in recommendations {
            self.inner()
                .recommendations_emitted
                .with_label_values(&[r.resource.as_str(), r.band.as_str()])
                .inc();
        }
    }

    pub fn collection_error_count(&self, kind: &str) -> u64 {
        self.inner().collection_errors.with_label_values(&[kind]).get()
    }
}

/// Structured logger for advisor events
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    pub fn log_usage_collected(&self, snapshot: &ResourceSnapshot, duration_ms: u128) {
        info!(
            event = "usage_collected",
            instance = %self.instance,
            nodes = snapshot.nodes.len(),
            workloads = snapshot.total_workloads(),
            duration_ms = duration_ms as u64,
            "Resource snapshot collected"
        );
    }

    pub fn log_collection_failed(&self, error: &CollectError) {
        warn!(
            event = "collection_failed",
            instance = %self.instance,
            kind = error.code(),
            retryable = error.is_retryable(),
            error = %error,
            "Resource snapshot collection failed"
        );
    }

    pub fn log_analysis(&self, snapshot: &ResourceSnapshot, recommendations: &[Recommendation]) {
        info!(
            event = "analysis_completed",
            instance = %self.instance,
            nodes = snapshot.nodes.len(),
            recommendations = recommendations.len(),
            "Utilization analysis completed"
        );
    }

    pub fn log_startup(&self, version: &str, port: u16) {
        info!(
            event = "service_started",
            instance = %self.instance,
            version = %version,
            port = port,
            "Resource advisor started"
        );
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "service_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Resource advisor shutting down"
        );
    }
}
