//! Spinnaker Gate request/response payloads
//!
//! These structs match the JSON exchanged with Gate's task, pipeline template,
//! pipeline and canary config endpoints.

use crate::constants::{COMPLETED_TASK_STATUSES, TERMINAL_TASK_STATUS};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Operation descriptor submitted to `POST /applications/{app}/tasks`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Application the task runs against
    pub application: String,
    /// Human-readable description shown in the Spinnaker UI
    pub description: String,
    /// Stages to execute; each carries its own `type`
    pub job: Vec<Value>,
}

/// Reference to an asynchronously running task
///
/// Gate answers submissions with `{"ref": "/tasks/<id>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRef {
    #[serde(rename = "ref")]
    pub reference: String,
}

impl TaskRef {
    #[must_use]
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }

    /// Task id without the `/tasks/` prefix
    #[must_use]
    pub fn id(&self) -> &str {
        self.reference
            .rsplit('/')
            .next()
            .unwrap_or(self.reference.as_str())
    }
}

impl std::fmt::Display for TaskRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reference)
    }
}

/// Task execution as reported by `GET /tasks/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Execution status (RUNNING, SUCCEEDED, TERMINAL, ...)
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub start_time: Option<i64>,
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl ExecutionResponse {
    /// Spinnaker will not report any further progress for this execution
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.end_time.is_some_and(|t| t > 0)
            || COMPLETED_TASK_STATUSES.contains(&self.status.as_str())
    }

    /// The execution ran and failed
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.status == TERMINAL_TASK_STATUS
    }
}
