//! # Reconciliation Entry Point
//!
//! Called by kube-runtime for every observed change of a managed resource.
//! Errors are handled by `runtime::error_policy`.

use super::kinds::ManagedKind;
use super::lifecycle::{self, Transition};
use super::store::KubeStore;
use super::types::{Reconciler, ReconcilerError};
use crate::crd::SpinnakerResource;
use crate::observability::metrics;
use kube_runtime::controller::Action;
use kube::ResourceExt;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

/// Reconcile one resource of kind `K`
///
/// Waits for the next change after success; the resource is not requeued on
/// a timer because nothing drifts on the Spinnaker side without a spec edit.
///
/// # Errors
/// Returns an error when the step could not complete; the error policy
/// decides when to retry
pub async fn reconcile<K: ManagedKind>(
    resource: Arc<K>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let start = Instant::now();
    let key = resource.resource_key();
    let span = info_span!(
        "reconcile",
        kind = K::KIND,
        name = %resource.name_any(),
        namespace = resource.namespace().as_deref().unwrap_or(""),
    );

    metrics::increment_reconciliations(K::KIND);

    let store = KubeStore::new(K::api(ctx.client.clone(), &resource), ctx.recorder.clone());
    let handler = K::handler(&ctx);
    let transition = lifecycle::run(resource.as_ref(), &handler, &store, &ctx.cancel)
        .instrument(span)
        .await?;

    metrics::observe_reconciliation_duration(K::KIND, start.elapsed().as_secs_f64());
    ctx.reset_backoff(&key);

    match transition {
        Transition::Applied { operation, succeeded } => {
            info!(resource = %key, %operation, succeeded, "reconcile.applied");
        }
        Transition::Deleted { succeeded } => {
            info!(resource = %key, succeeded, "reconcile.deleted");
        }
        Transition::Unchanged | Transition::DriftIgnored | Transition::Removed => {
            debug!(resource = %key, ?transition, "reconcile.idle");
        }
    }

    Ok(Action::await_change())
}
