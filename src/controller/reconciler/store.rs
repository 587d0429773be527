//! # Resource Store
//!
//! Writes the controller performs against the Kubernetes API: finalizer
//! bookkeeping, status updates and events.
//!
//! Finalizer and status patches carry the `resourceVersion` they were
//! computed from, so a concurrent writer makes the step fail with
//! [`StoreError::Conflict`] instead of silently dropping someone else's
//! finalizer or overwriting the recorded status history. Every write returns
//! the object as stored, which the caller must use for its next write.

use crate::constants::{CONTROLLER_NAME, FINALIZER_NAME};
use crate::crd::{SpinnakerResource, SpinnakerResourceStatus};
use async_trait::async_trait;
use kube::api::{Api, Patch, PatchParams};
use kube_runtime::events::{Event, EventType, Recorder};
use kube::{Resource, ResourceExt};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("conflicting write to {resource}: {message}")]
    Conflict { resource: String, message: String },
    #[error("Kubernetes API request failed: {0}")]
    Api(#[from] kube::Error),
}

/// Kubernetes event severity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Normal,
    Warning,
}

/// Event attached to a resource after a remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceEvent {
    pub kind: EventKind,
    pub reason: String,
    pub note: String,
    pub action: String,
}

/// Persistence operations the lifecycle needs from the cluster
#[async_trait]
pub trait ResourceStore<K: SpinnakerResource>: Send + Sync {
    /// Attach the controller finalizer; no-op if already present
    async fn add_finalizer(&self, resource: &K) -> Result<K, StoreError>;

    /// Drop the controller finalizer; no-op if absent
    async fn remove_finalizer(&self, resource: &K) -> Result<K, StoreError>;

    /// Replace the status subresource
    async fn update_status(
        &self,
        resource: &K,
        status: &SpinnakerResourceStatus,
    ) -> Result<K, StoreError>;

    async fn publish_event(&self, resource: &K, event: &ResourceEvent) -> Result<(), StoreError>;
}

/// [`ResourceStore`] backed by the Kubernetes API
#[derive(Clone)]
pub struct KubeStore<K: SpinnakerResource> {
    api: Api<K>,
    recorder: Recorder,
}

impl<K: SpinnakerResource> KubeStore<K> {
    #[must_use]
    pub fn new(api: Api<K>, recorder: Recorder) -> Self {
        Self { api, recorder }
    }

    async fn patch_finalizers(&self, resource: &K, finalizers: Vec<String>) -> Result<K, StoreError> {
        let name = resource.name_any();
        let patch = json!({
            "metadata": {
                "finalizers": finalizers,
                "resourceVersion": resource.resource_version(),
            }
        });
        self.api
            .patch(&name, &PatchParams::apply(CONTROLLER_NAME), &Patch::Merge(&patch))
            .await
            .map_err(|e| classify(resource, e))
    }
}

fn classify<K: SpinnakerResource>(resource: &K, error: kube::Error) -> StoreError {
    match error {
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
            resource: resource.resource_key(),
            message: api_err.message,
        },
        other => StoreError::Api(other),
    }
}

#[async_trait]
impl<K: SpinnakerResource> ResourceStore<K> for KubeStore<K> {
    async fn add_finalizer(&self, resource: &K) -> Result<K, StoreError> {
        if resource.has_finalizer() {
            return Ok(resource.clone());
        }
        let mut finalizers = resource.finalizers().to_vec();
        finalizers.push(FINALIZER_NAME.to_string());
        self.patch_finalizers(resource, finalizers).await
    }

    async fn remove_finalizer(&self, resource: &K) -> Result<K, StoreError> {
        if !resource.has_finalizer() {
            return Ok(resource.clone());
        }
        let finalizers = resource
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != FINALIZER_NAME)
            .cloned()
            .collect();
        self.patch_finalizers(resource, finalizers).await
    }

    async fn update_status(
        &self,
        resource: &K,
        status: &SpinnakerResourceStatus,
    ) -> Result<K, StoreError> {
        let patch = json!({
            "metadata": { "resourceVersion": resource.resource_version() },
            "status": status,
        });
        self.api
            .patch_status(
                &resource.name_any(),
                &PatchParams::apply(CONTROLLER_NAME),
                &Patch::Merge(&patch),
            )
            .await
            .map_err(|e| classify(resource, e))
    }

    async fn publish_event(&self, resource: &K, event: &ResourceEvent) -> Result<(), StoreError> {
        let type_ = match event.kind {
            EventKind::Normal => EventType::Normal,
            EventKind::Warning => EventType::Warning,
        };
        self.recorder
            .publish(
                &Event {
                    type_,
                    reason: event.reason.clone(),
                    note: Some(event.note.clone()),
                    action: event.action.clone(),
                    secondary: None,
                },
                &resource.object_ref(&()),
            )
            .await?;
        Ok(())
    }
}
