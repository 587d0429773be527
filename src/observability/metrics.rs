//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `spinnaker_dcd_reconciliations_total` - Reconciliations by kind
//! - `spinnaker_dcd_reconciliation_errors_total` - Reconciliation errors by kind and reason
//! - `spinnaker_dcd_reconciliation_duration_seconds` - Duration of reconciliations by kind
//! - `spinnaker_dcd_remote_operations_total` - Completed remote operations by kind, operation and outcome
//! - `spinnaker_dcd_gate_requests_total` - HTTP requests sent to Spinnaker Gate
//! - `spinnaker_dcd_gate_request_duration_seconds` - Duration of Gate requests
//! - `spinnaker_dcd_task_polls_total` - Task status checks issued while waiting for completion
//! - `spinnaker_dcd_export_lookups_total` - Export registry lookups by result
//! - `spinnaker_dcd_requeues_total` - Requeues scheduled by the error policy

use anyhow::Result;
use prometheus::{Histogram, HistogramVec, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "spinnaker_dcd_reconciliations_total",
            "Total number of reconciliations by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "spinnaker_dcd_reconciliation_errors_total",
            "Total number of reconciliation errors by kind and reason",
        ),
        &["kind", "reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "spinnaker_dcd_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static REMOTE_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "spinnaker_dcd_remote_operations_total",
            "Total number of completed remote operations by kind, operation and outcome",
        ),
        &["kind", "operation", "outcome"],
    )
    .expect("Failed to create REMOTE_OPERATIONS_TOTAL metric - this should never happen")
});

static GATE_REQUESTS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "spinnaker_dcd_gate_requests_total",
            "Total number of HTTP requests sent to Spinnaker Gate",
        ),
        &["operation", "result"],
    )
    .expect("Failed to create GATE_REQUESTS_TOTAL metric - this should never happen")
});

static GATE_REQUEST_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "spinnaker_dcd_gate_request_duration_seconds",
            "Duration of Spinnaker Gate requests in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
        &["operation"],
    )
    .expect("Failed to create GATE_REQUEST_DURATION metric - this should never happen")
});

static TASK_POLLS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "spinnaker_dcd_task_polls_total",
        "Total number of task status checks issued while waiting for completion",
    )
    .expect("Failed to create TASK_POLLS_TOTAL metric - this should never happen")
});

static TASK_WAIT_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "spinnaker_dcd_task_wait_duration_seconds",
            "Time spent waiting for Spinnaker tasks to complete",
        )
        .buckets(vec![0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0]),
    )
    .expect("Failed to create TASK_WAIT_DURATION metric - this should never happen")
});

static EXPORT_LOOKUPS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "spinnaker_dcd_export_lookups_total",
            "Total number of export registry lookups by result",
        ),
        &["result"],
    )
    .expect("Failed to create EXPORT_LOOKUPS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "spinnaker_dcd_requeues_total",
            "Total number of requeues scheduled by the error policy",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Error documentation is provided in doc comments"
)]
/// Register every controller metric with [`REGISTRY`]
///
/// Fails if called twice, since prometheus rejects duplicate collectors.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(REMOTE_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GATE_REQUESTS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(GATE_REQUEST_DURATION.clone()))?;
    REGISTRY.register(Box::new(TASK_POLLS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(TASK_WAIT_DURATION.clone()))?;
    REGISTRY.register(Box::new(EXPORT_LOOKUPS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(kind: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_reconciliation_errors(kind: &str, reason: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[kind, reason])
        .inc();
}

pub fn observe_reconciliation_duration(kind: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration);
}

/// Record a remote create/update/publish/delete that reached a terminal state
pub fn record_remote_operation(kind: &str, operation: &str, succeeded: bool) {
    let outcome = if succeeded { "succeeded" } else { "terminal" };
    REMOTE_OPERATIONS_TOTAL
        .with_label_values(&[kind, operation, outcome])
        .inc();
}

/// Record one HTTP exchange with Gate; `ok` is false on transport failure
pub fn observe_gate_request(operation: &str, duration: f64, ok: bool) {
    let result = if ok { "ok" } else { "error" };
    GATE_REQUESTS_TOTAL
        .with_label_values(&[operation, result])
        .inc();
    GATE_REQUEST_DURATION
        .with_label_values(&[operation])
        .observe(duration);
}

pub fn increment_task_polls() {
    TASK_POLLS_TOTAL.inc();
}

pub fn observe_task_wait_duration(duration: f64) {
    TASK_WAIT_DURATION.observe(duration);
}

/// Record an export lookup; `result` is one of `found`, `not_found`, `error`
pub fn increment_export_lookups(result: &str) {
    EXPORT_LOOKUPS_TOTAL.with_label_values(&[result]).inc();
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
