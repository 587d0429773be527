//! Spinnaker pipelines. Saved once through `POST /pipelines`; later spec
//! changes are not pushed.

use crate::controller::reconciler::change::Change;
use crate::controller::reconciler::executor::{CancelSignal, Operation, TaskOutcome};
use crate::controller::reconciler::lifecycle::{Applied, RemoteHandler};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{string_field, Document, Pipeline, SpinnakerResource, SpinnakerResourceRef};
use crate::spinnaker::GateApi;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct PipelineHandler {
    gate: Arc<dyn GateApi>,
}

impl PipelineHandler {
    #[must_use]
    pub fn new(gate: Arc<dyn GateApi>) -> Self {
        Self { gate }
    }
}

fn required<'a>(document: &'a Document, field: &str) -> Result<&'a str, ReconcilerError> {
    string_field(document, field)
        .ok_or_else(|| ReconcilerError::malformed(Pipeline::KIND, format!("spec.{field} is required")))
}

#[async_trait]
impl RemoteHandler<Pipeline> for PipelineHandler {
    fn operation_for(&self, change: Change) -> Option<Operation> {
        match change {
            Change::Initial => Some(Operation::Create),
            Change::Drift => None,
        }
    }

    async fn apply(
        &self,
        resource: &Pipeline,
        _: Operation,
        _: &CancelSignal,
    ) -> Result<Applied, ReconcilerError> {
        let document = resource.document();
        let application = required(document, "application")?;
        let name = required(document, "name")?;

        self.gate
            .save_pipeline(&Value::Object(document.clone()))
            .await?;

        Ok(Applied {
            outcome: TaskOutcome::succeeded(format!("pipeline {application}/{name} saved")),
            remote: SpinnakerResourceRef {
                application_name: Some(application.to_string()),
                id: string_field(document, "id").map(str::to_string),
                name: Some(name.to_string()),
            },
        })
    }

    async fn delete(
        &self,
        resource: &Pipeline,
        _: &CancelSignal,
    ) -> Result<TaskOutcome, ReconcilerError> {
        let recorded = resource.observed().map(|s| &s.spinnaker_resource);
        let application = match recorded.and_then(|r| r.application_name.as_deref()) {
            Some(application) => application,
            None => required(resource.document(), "application")?,
        };
        let name = match recorded.and_then(|r| r.name.as_deref()) {
            Some(name) => name,
            None => required(resource.document(), "name")?,
        };

        self.gate.delete_pipeline(application, name).await?;
        Ok(TaskOutcome::succeeded(format!(
            "pipeline {application}/{name} deleted"
        )))
    }
}
