//! # Spinnaker Resource Status
//!
//! Observed state shared by every Spinnaker custom resource. Owned exclusively
//! by the controller.

use serde::{Deserialize, Serialize};

/// Status of a Spinnaker custom resource
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpinnakerResourceStatus {
    /// Identifying attributes of the corresponding Spinnaker object
    /// Empty until the first completed apply
    #[serde(default)]
    pub spinnaker_resource: SpinnakerResourceRef,
    /// SHA-256 of the spec at the last completed apply
    /// Empty means the spec has never been applied
    #[serde(default)]
    pub hash: String,
    /// Append-only record of every transition
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Coarse human-readable state
    /// Values: Deployed, Failed, Deleted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

/// Reference to the object on the Spinnaker side
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SpinnakerResourceRef {
    /// Spinnaker application the object belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,
    /// Spinnaker identifier (pipeline/template/canary config id)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Spinnaker display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl SpinnakerResourceRef {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.application_name.is_none() && self.id.is_none() && self.name.is_none()
    }
}

/// One recorded transition outcome
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    /// Values: CreationComplete, UpdateComplete, PublishingComplete, DeletionComplete
    pub r#type: String,
    /// Status of the condition (True, False)
    pub status: String,
    /// Machine-readable reason
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Message describing the outcome
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Time the transition was recorded (RFC3339)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_transition_time: Option<String>,
}
