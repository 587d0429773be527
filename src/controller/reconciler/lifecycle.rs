//! # Lifecycle
//!
//! Kind-independent state machine that drives a resource through apply,
//! steady state and finalizer-gated deletion.
//!
//! ```text
//!   Unmanaged --apply--> Ready | Failed --spec change--> Ready | Failed
//!        |                    |
//!        +---- deletion ------+--> delete remote, release finalizer --> Removed
//! ```
//!
//! The finalizer is attached only after the first apply has completed and is
//! released only after the delete attempt has completed. Faults (transport,
//! timeout, malformed spec, missing export) abort the step before any status
//! write, so the next attempt starts from the same observed state.

use super::change::{should_apply, Change};
use super::executor::{CancelSignal, Operation, TaskOutcome};
use super::status;
use super::store::{ResourceEvent, ResourceStore};
use super::types::ReconcilerError;
use crate::crd::{SpinnakerResource, SpinnakerResourceRef};
use crate::observability::metrics;
use async_trait::async_trait;
use kube::ResourceExt;
use tracing::{debug, info, warn};

/// Result of applying a document on the Spinnaker side
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    pub outcome: TaskOutcome,
    /// Remote identity to record; empty keeps the previous one
    pub remote: SpinnakerResourceRef,
}

/// Kind-specific remote operations
#[async_trait]
pub trait RemoteHandler<K: SpinnakerResource>: Send + Sync {
    /// Operation used for a detected change; `None` means the kind cannot
    /// apply it and the change is ignored
    fn operation_for(&self, change: Change) -> Option<Operation>;

    /// Push the desired state to Spinnaker and wait for the outcome
    async fn apply(
        &self,
        resource: &K,
        operation: Operation,
        cancel: &CancelSignal,
    ) -> Result<Applied, ReconcilerError>;

    /// Remove the Spinnaker object and wait for the outcome
    async fn delete(&self, resource: &K, cancel: &CancelSignal)
        -> Result<TaskOutcome, ReconcilerError>;
}

/// Lifecycle state derived from a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Never applied and no cleanup owed
    Unmanaged,
    /// Last apply succeeded
    Ready,
    /// Last apply ran and was rejected
    Failed,
    /// Deletion requested and no cleanup owed
    Removed,
}

impl LifecycleState {
    #[must_use]
    pub fn of<K: SpinnakerResource>(resource: &K) -> Self {
        if resource.deletion_requested() && !resource.has_finalizer() {
            return LifecycleState::Removed;
        }
        if resource.last_hash().is_empty() {
            return LifecycleState::Unmanaged;
        }
        let failed = resource
            .observed()
            .and_then(|s| s.conditions.last())
            .is_some_and(|c| c.status == "False");
        if failed {
            LifecycleState::Failed
        } else {
            LifecycleState::Ready
        }
    }
}

/// Next step for a resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Apply { operation: Operation, hash: String },
    Delete,
    /// Spec matches the last applied hash
    Unchanged,
    /// Spec changed but the kind has no way to apply it
    DriftIgnored,
    /// Nothing left to clean up
    Removed,
}

/// Transition performed by [`run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied { operation: Operation, succeeded: bool },
    Deleted { succeeded: bool },
    Unchanged,
    DriftIgnored,
    Removed,
}

/// Decide what to do with `resource` without touching anything
#[must_use]
pub fn plan<K, H>(resource: &K, handler: &H) -> Step
where
    K: SpinnakerResource,
    H: RemoteHandler<K> + ?Sized,
{
    if resource.deletion_requested() {
        return if resource.has_finalizer() {
            Step::Delete
        } else {
            Step::Removed
        };
    }

    let decision = should_apply(resource.document(), resource.last_hash());
    match decision.change {
        None => Step::Unchanged,
        Some(change) => match handler.operation_for(change) {
            Some(operation) => Step::Apply {
                operation,
                hash: decision.hash,
            },
            None => Step::DriftIgnored,
        },
    }
}

/// Run one reconciliation step for `resource`
///
/// # Errors
/// Returns an error when a remote call or a store write cannot complete. No
/// status is written in that case.
pub async fn run<K, H, S>(
    resource: &K,
    handler: &H,
    store: &S,
    cancel: &CancelSignal,
) -> Result<Transition, ReconcilerError>
where
    K: SpinnakerResource,
    H: RemoteHandler<K> + ?Sized,
    S: ResourceStore<K> + ?Sized,
{
    let name = resource.name_any();

    match plan(resource, handler) {
        Step::Removed => {
            debug!(resource = %resource.resource_key(), "lifecycle.removed");
            Ok(Transition::Removed)
        }
        Step::Unchanged => {
            debug!(resource = %resource.resource_key(), "lifecycle.unchanged");
            Ok(Transition::Unchanged)
        }
        Step::DriftIgnored => {
            warn!(
                resource = %resource.resource_key(),
                "spec changed after creation but {} does not support updates; ignoring",
                K::KIND
            );
            Ok(Transition::DriftIgnored)
        }
        Step::Apply { operation, hash } => {
            info!(resource = %resource.resource_key(), %operation, "lifecycle.apply");
            let applied = handler.apply(resource, operation, cancel).await?;
            let succeeded = applied.outcome.is_success();
            metrics::record_remote_operation(K::KIND, operation.as_str(), succeeded);

            let current = store.add_finalizer(resource).await?;

            let mut observed = current.observed().cloned().unwrap_or_default();
            status::record_apply(
                &mut observed,
                operation,
                &applied.outcome,
                hash,
                applied.remote,
            );
            let current = store.update_status(&current, &observed).await?;

            let event = status::event_for(K::KIND, &name, operation, &applied.outcome);
            publish(store, &current, &event).await;

            Ok(Transition::Applied {
                operation,
                succeeded,
            })
        }
        Step::Delete => {
            info!(resource = %resource.resource_key(), "lifecycle.delete");
            let outcome = handler.delete(resource, cancel).await?;
            let succeeded = outcome.is_success();
            metrics::record_remote_operation(K::KIND, Operation::Delete.as_str(), succeeded);
            if !succeeded {
                warn!(
                    resource = %resource.resource_key(),
                    details = %outcome.details,
                    "remote delete was rejected; releasing finalizer anyway"
                );
            }

            let mut observed = resource.observed().cloned().unwrap_or_default();
            status::record_delete(&mut observed, &outcome);
            let current = store.update_status(resource, &observed).await?;

            let event = status::event_for(K::KIND, &name, Operation::Delete, &outcome);
            publish(store, &current, &event).await;

            store.remove_finalizer(&current).await?;
            Ok(Transition::Deleted { succeeded })
        }
    }
}

async fn publish<K, S>(store: &S, resource: &K, event: &ResourceEvent)
where
    K: SpinnakerResource,
    S: ResourceStore<K> + ?Sized,
{
    if let Err(e) = store.publish_event(resource, event).await {
        warn!(resource = %resource.resource_key(), reason = %event.reason, error = %e, "failed to publish event");
    }
}
