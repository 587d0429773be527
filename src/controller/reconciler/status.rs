//! # Status Reporting
//!
//! Records the outcome of each remote operation on the resource status and
//! builds the matching Kubernetes event.
//!
//! Conditions are an audit trail: one record is appended per transition and
//! earlier records are never modified or deduplicated.

use super::executor::{Operation, TaskOutcome};
use super::store::{EventKind, ResourceEvent};
use crate::crd::{Condition, SpinnakerResourceRef, SpinnakerResourceStatus};

/// Condition type recorded for each operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConditionType {
    CreationComplete,
    UpdateComplete,
    PublishingComplete,
    DeletionComplete,
}

impl ConditionType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionType::CreationComplete => "CreationComplete",
            ConditionType::UpdateComplete => "UpdateComplete",
            ConditionType::PublishingComplete => "PublishingComplete",
            ConditionType::DeletionComplete => "DeletionComplete",
        }
    }
}

impl From<Operation> for ConditionType {
    fn from(operation: Operation) -> Self {
        match operation {
            Operation::Create => ConditionType::CreationComplete,
            Operation::Update => ConditionType::UpdateComplete,
            Operation::Publish => ConditionType::PublishingComplete,
            Operation::Delete => ConditionType::DeletionComplete,
        }
    }
}

/// Coarse resource phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Deployed,
    Failed,
    Deleted,
}

impl Phase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Deployed => "Deployed",
            Phase::Failed => "Failed",
            Phase::Deleted => "Deleted",
        }
    }
}

/// Event and condition reason for an operation outcome
#[must_use]
pub fn reason(operation: Operation, outcome: &TaskOutcome) -> &'static str {
    match (operation, outcome.is_success()) {
        (Operation::Create, true) => "SuccessfulCreated",
        (Operation::Update, true) => "SuccessfulUpdated",
        (Operation::Publish, true) => "SuccessfulPublished",
        (Operation::Delete, true) => "SuccessfulDeleted",
        (Operation::Create, false) => "CreateFailed",
        (Operation::Update, false) => "UpdateFailed",
        (Operation::Publish, false) => "PublishFailed",
        (Operation::Delete, false) => "DeleteFailed",
    }
}

fn condition(operation: Operation, outcome: &TaskOutcome) -> Condition {
    Condition {
        r#type: ConditionType::from(operation).as_str().to_string(),
        status: if outcome.is_success() { "True" } else { "False" }.to_string(),
        reason: Some(reason(operation, outcome).to_string()),
        message: Some(outcome.details.clone()),
        last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
    }
}

/// Record a completed create/update/publish
///
/// The hash is recorded whether or not Spinnaker accepted the change, so a
/// rejected spec is not resubmitted until it is edited again.
pub fn record_apply(
    status: &mut SpinnakerResourceStatus,
    operation: Operation,
    outcome: &TaskOutcome,
    hash: String,
    remote: SpinnakerResourceRef,
) {
    status.hash = hash;
    if !remote.is_empty() {
        status.spinnaker_resource = remote;
    }
    status.conditions.push(condition(operation, outcome));
    status.phase = Some(
        if outcome.is_success() {
            Phase::Deployed
        } else {
            Phase::Failed
        }
        .as_str()
        .to_string(),
    );
}

/// Record a completed delete
pub fn record_delete(status: &mut SpinnakerResourceStatus, outcome: &TaskOutcome) {
    status.conditions.push(condition(Operation::Delete, outcome));
    status.phase = Some(
        if outcome.is_success() {
            Phase::Deleted
        } else {
            Phase::Failed
        }
        .as_str()
        .to_string(),
    );
}

/// Build the event published for an operation outcome
#[must_use]
pub fn event_for(
    kind: &str,
    name: &str,
    operation: Operation,
    outcome: &TaskOutcome,
) -> ResourceEvent {
    let verb = match operation {
        Operation::Create => "Created",
        Operation::Update => "Updated",
        Operation::Publish => "Published",
        Operation::Delete => "Deleted",
    };
    let (event_kind, note) = if outcome.is_success() {
        (EventKind::Normal, format!("{verb} {kind}: {name:?}"))
    } else {
        (
            EventKind::Warning,
            format!("{kind} {name:?} was not {}: {}", verb.to_lowercase(), outcome.details),
        )
    };
    ResourceEvent {
        kind: event_kind,
        reason: reason(operation, outcome).to_string(),
        note,
        action: operation.as_str().to_string(),
    }
}
