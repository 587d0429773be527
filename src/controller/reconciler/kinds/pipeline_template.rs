//! Managed pipeline templates.
//!
//! `${ImportValue:...}` placeholders are resolved before publishing. Publishing
//! is an upsert, so every spec change republishes the template.

use crate::controller::reconciler::change::Change;
use crate::controller::reconciler::executor::{CancelSignal, Operation, TaskExecutor, TaskOutcome};
use crate::controller::reconciler::lifecycle::{Applied, RemoteHandler};
use crate::controller::reconciler::template::TemplateResolver;
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{string_field, PipelineTemplate, SpinnakerResource, SpinnakerResourceRef};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

#[derive(Debug)]
pub struct PipelineTemplateHandler {
    executor: TaskExecutor,
    resolver: TemplateResolver,
}

impl PipelineTemplateHandler {
    #[must_use]
    pub fn new(executor: TaskExecutor, resolver: TemplateResolver) -> Self {
        Self { executor, resolver }
    }
}

#[async_trait]
impl RemoteHandler<PipelineTemplate> for PipelineTemplateHandler {
    fn operation_for(&self, _: Change) -> Option<Operation> {
        Some(Operation::Publish)
    }

    async fn apply(
        &self,
        resource: &PipelineTemplate,
        operation: Operation,
        cancel: &CancelSignal,
    ) -> Result<Applied, ReconcilerError> {
        if string_field(resource.document(), "id").is_none() {
            return Err(ReconcilerError::malformed(PipelineTemplate::KIND, "spec.id is required"));
        }

        let resolved = self.resolver.resolve(resource.document()).await?;
        let id = string_field(&resolved, "id")
            .ok_or_else(|| {
                ReconcilerError::malformed(PipelineTemplate::KIND, "spec.id resolved to an empty value")
            })?
            .to_string();
        debug!(template = %id, "template.resolved");

        let template = Value::Object(resolved);
        let gate = self.executor.gate();
        let outcome = self
            .executor
            .execute(operation, gate.publish_template(&template, &id), cancel)
            .await?;

        Ok(Applied {
            outcome,
            remote: SpinnakerResourceRef {
                id: Some(id),
                ..SpinnakerResourceRef::default()
            },
        })
    }

    async fn delete(
        &self,
        resource: &PipelineTemplate,
        cancel: &CancelSignal,
    ) -> Result<TaskOutcome, ReconcilerError> {
        let id = resource
            .observed()
            .and_then(|s| s.spinnaker_resource.id.as_deref())
            .filter(|id| !id.is_empty())
            .or_else(|| string_field(resource.document(), "id"))
            .ok_or_else(|| ReconcilerError::malformed(PipelineTemplate::KIND, "spec.id is required"))?
            .to_string();

        let gate = self.executor.gate();
        Ok(self
            .executor
            .execute(Operation::Delete, gate.delete_template(&id), cancel)
            .await?)
    }
}
