//! # Error Policy
//!
//! Error handling and backoff logic for the controller watch loops.
//! This module handles reconciliation errors and watch stream errors.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::SpinnakerResource;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Handle reconciliation errors
///
/// A missing template export is retried after the fixed export delay. Every
/// other fault gets Fibonacci backoff tracked per resource, so one failing
/// resource never delays the others.
pub fn handle_reconciliation_error<K: SpinnakerResource>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Reconciler>,
) -> Action {
    let resource_key = obj.resource_key();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource = %resource_key,
        error = %error
    );
    let _error_guard = error_span.enter();

    metrics::increment_reconciliation_errors(K::KIND, error.metric_label());

    if error.is_export_not_found() {
        let delay = ctx.config.export_retry_delay();
        info!(
            "Export referenced by {} does not exist yet: {}; retrying in {}s",
            resource_key,
            error,
            delay.as_secs()
        );
        metrics::increment_requeues("export-not-found");
        return Action::requeue(delay);
    }

    error!("Reconciliation error for {}: {:?}", resource_key, error);

    let (backoff_seconds, error_count) = ctx.next_backoff(&resource_key);
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::seconds(i64::try_from(backoff_seconds).unwrap_or(i64::MAX));

    info!(
        "Retrying {} with Fibonacci backoff: {}s (error count: {}, next attempt: {})",
        resource_key,
        backoff_seconds,
        error_count,
        next_trigger_time.to_rfc3339()
    );

    metrics::increment_requeues("error-backoff");
    Action::requeue(Duration::from_secs(backoff_seconds))
}

/// Class of a controller stream error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamErrorClass {
    /// The object or its CRD is gone
    NotFound,
    /// RBAC revoked or token expired
    Unauthorized,
    /// Resource version too old; the watcher re-lists
    Expired,
    /// API server is throttling or reinitializing storage
    Throttled,
    /// Reconciliation error already handled by the error policy
    Reconcile,
    Other,
}

/// Classify a controller stream error from its debug representation
#[must_use]
pub fn classify_stream_error(error_string: &str) -> StreamErrorClass {
    // 404s can carry "WatchFailed" in the chain, so check them before 401
    let is_not_found = error_string.contains("ObjectNotFound")
        || error_string.contains("404")
        || error_string.contains("not found");
    if error_string.starts_with("ReconcilerFailed") {
        StreamErrorClass::Reconcile
    } else if is_not_found {
        StreamErrorClass::NotFound
    } else if error_string.contains("401") || error_string.contains("Unauthorized") {
        StreamErrorClass::Unauthorized
    } else if error_string.contains("410")
        || error_string.contains("too old resource version")
        || error_string.contains("Expired")
        || error_string.contains("Gone")
    {
        StreamErrorClass::Expired
    } else if error_string.contains("429")
        || error_string.contains("storage is (re)initializing")
        || error_string.contains("TooManyRequests")
    {
        StreamErrorClass::Throttled
    } else {
        StreamErrorClass::Other
    }
}

/// Log a controller stream error according to its class
pub fn handle_watch_stream_error(kind: &str, error_string: &str) {
    match classify_stream_error(error_string) {
        StreamErrorClass::Reconcile => {}
        StreamErrorClass::NotFound => warn!(
            kind,
            "{} not found (404) - normal if the resource was deleted, otherwise check the CRD is installed: {}",
            kind,
            error_string
        ),
        StreamErrorClass::Unauthorized => error!(
            kind,
            "Watch authentication failed (401 Unauthorized) - check the controller's ClusterRole still grants access to {} resources",
            kind
        ),
        StreamErrorClass::Expired => {
            warn!(kind, error_type = "410", "watch.error.resource_version_expired");
        }
        StreamErrorClass::Throttled => {
            warn!(kind, error_type = "429", "watch.error.throttled");
        }
        StreamErrorClass::Other => error!(kind, "Controller stream error: {}", error_string),
    }
}
