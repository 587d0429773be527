//! Kayenta canary configs, saved through Gate's `/v2/canaryConfig` endpoints.
//!
//! Gate answers these calls synchronously with a bare status code: 200 is
//! success, a 404 on lookup means the config does not exist yet, anything
//! else is a fault.

use crate::controller::reconciler::change::Change;
use crate::controller::reconciler::executor::{CancelSignal, Operation, TaskOutcome};
use crate::controller::reconciler::lifecycle::{Applied, RemoteHandler};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{string_field, CanaryConfig, SpinnakerResource, SpinnakerResourceRef};
use crate::spinnaker::{GateApi, GateError};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct CanaryConfigHandler {
    gate: Arc<dyn GateApi>,
}

impl CanaryConfigHandler {
    #[must_use]
    pub fn new(gate: Arc<dyn GateApi>) -> Self {
        Self { gate }
    }

    /// Update the config if it exists, create it otherwise
    async fn save(&self, id: &str, config: &Value) -> Result<(), ReconcilerError> {
        let (operation, status) = match self.gate.get_canary_config(id).await? {
            StatusCode::OK => {
                debug!(canary_config = id, "canary config exists; updating");
                ("update_canary_config", self.gate.update_canary_config(id, config).await?)
            }
            StatusCode::NOT_FOUND => {
                debug!(canary_config = id, "canary config not found; creating");
                ("create_canary_config", self.gate.create_canary_config(config).await?)
            }
            status => return Err(unexpected("get_canary_config", status)),
        };
        if status != StatusCode::OK {
            return Err(unexpected(operation, status));
        }
        Ok(())
    }
}

fn unexpected(operation: &'static str, status: StatusCode) -> ReconcilerError {
    ReconcilerError::Gate(GateError::UnexpectedStatus {
        operation,
        status: status.as_u16(),
        body: String::new(),
    })
}

#[async_trait]
impl RemoteHandler<CanaryConfig> for CanaryConfigHandler {
    fn operation_for(&self, change: Change) -> Option<Operation> {
        match change {
            Change::Initial => Some(Operation::Create),
            Change::Drift => Some(Operation::Update),
        }
    }

    async fn apply(
        &self,
        resource: &CanaryConfig,
        _: Operation,
        _: &CancelSignal,
    ) -> Result<Applied, ReconcilerError> {
        let document = resource.document();
        let id = string_field(document, "id")
            .ok_or_else(|| ReconcilerError::malformed(CanaryConfig::KIND, "spec.id is required"))?;

        self.save(id, &Value::Object(document.clone())).await?;

        Ok(Applied {
            outcome: TaskOutcome::succeeded(format!("canary config {id} saved")),
            remote: SpinnakerResourceRef {
                id: Some(id.to_string()),
                name: string_field(document, "name").map(str::to_string),
                ..SpinnakerResourceRef::default()
            },
        })
    }

    async fn delete(
        &self,
        resource: &CanaryConfig,
        _: &CancelSignal,
    ) -> Result<TaskOutcome, ReconcilerError> {
        let id = resource
            .observed()
            .and_then(|s| s.spinnaker_resource.id.as_deref())
            .or_else(|| string_field(resource.document(), "id"))
            .ok_or_else(|| ReconcilerError::malformed(CanaryConfig::KIND, "spec.id is required"))?;

        let status = self.gate.delete_canary_config(id).await?;
        if status != StatusCode::OK {
            return Err(unexpected("delete_canary_config", status));
        }
        Ok(TaskOutcome::succeeded(format!("canary config {id} deleted")))
    }
}
