//! # Types
//!
//! Core types for the reconciler.

use super::executor::{CancelSignal, PollSettings, TaskError, TaskExecutor};
use super::store::StoreError;
use super::template::{ResolveError, TemplateResolver};
use crate::config::ControllerConfig;
use crate::controller::backoff::BackoffState;
use crate::exports::ExportRegistry;
use crate::spinnaker::{GateApi, GateError};
use kube_runtime::events::{Recorder, Reporter};
use kube::Client;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    Task(#[from] TaskError),

    #[error("Spinnaker Gate request failed: {0}")]
    Gate(#[from] GateError),

    #[error("template variable resolution failed: {0}")]
    Template(#[from] ResolveError),

    #[error("malformed {kind} spec: {reason}")]
    MalformedSpec { kind: &'static str, reason: String },

    #[error("failed to persist resource state: {0}")]
    Store(#[from] StoreError),
}

impl ReconcilerError {
    pub(crate) fn malformed(kind: &'static str, reason: impl Into<String>) -> Self {
        ReconcilerError::MalformedSpec {
            kind,
            reason: reason.into(),
        }
    }

    /// A referenced export does not exist yet; retry after a fixed delay
    #[must_use]
    pub fn is_export_not_found(&self) -> bool {
        matches!(self, ReconcilerError::Template(e) if e.is_not_found())
    }

    /// Short label for metrics
    #[must_use]
    pub fn metric_label(&self) -> &'static str {
        match self {
            ReconcilerError::Task(TaskError::Timeout { .. }) => "task_timeout",
            ReconcilerError::Task(TaskError::Cancelled { .. }) => "cancelled",
            ReconcilerError::Task(_) | ReconcilerError::Gate(_) => "gate",
            ReconcilerError::Template(e) if e.is_not_found() => "export_not_found",
            ReconcilerError::Template(_) => "export_registry",
            ReconcilerError::MalformedSpec { .. } => "malformed_spec",
            ReconcilerError::Store(StoreError::Conflict { .. }) => "conflict",
            ReconcilerError::Store(_) => "kubernetes",
        }
    }
}

/// Shared context handed to every reconciliation
pub struct Reconciler {
    pub client: Client,
    pub recorder: Recorder,
    pub executor: TaskExecutor,
    pub resolver: TemplateResolver,
    pub config: ControllerConfig,
    /// Fires on shutdown; aborts in-flight task polling
    pub cancel: CancelSignal,
    // Backoff state per resource (identified by kind/namespace/name)
    pub backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .field("executor", &self.executor)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        client: Client,
        gate: Arc<dyn GateApi>,
        registry: Arc<dyn ExportRegistry>,
        config: ControllerConfig,
        cancel: CancelSignal,
    ) -> Self {
        let reporter = Reporter {
            controller: crate::constants::CONTROLLER_NAME.to_string(),
            instance: std::env::var("POD_NAME").ok(),
        };
        let settings = PollSettings {
            timeout: config.poll_timeout(),
            interval: config.poll_interval(),
        };
        Self {
            recorder: Recorder::new(client.clone(), reporter),
            client,
            executor: TaskExecutor::new(gate, settings),
            resolver: TemplateResolver::new(registry),
            config,
            cancel,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Record an error for `key` and return the delay before the next attempt
    ///
    /// Returns `(delay_secs, error_count)`.
    pub fn next_backoff(&self, key: &str) -> (u64, u32) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let state = states.entry(key.to_string()).or_insert_with(|| {
            BackoffState::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
        });
        state.increment_error();
        (state.backoff.next_backoff_seconds(), state.error_count)
    }

    /// Forget the error history of `key` after a successful reconciliation
    pub fn reset_backoff(&self, key: &str) {
        let mut states = self
            .backoff_states
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        states.remove(key);
    }
}
