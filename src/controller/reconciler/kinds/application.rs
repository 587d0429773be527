//! Spinnaker applications, managed through `createApplication`,
//! `updateApplication` and `deleteApplication` orchestration tasks.

use crate::controller::reconciler::change::Change;
use crate::controller::reconciler::executor::{
    application_task, CancelSignal, Operation, TaskExecutor, TaskOutcome,
};
use crate::controller::reconciler::lifecycle::{Applied, RemoteHandler};
use crate::controller::reconciler::types::ReconcilerError;
use crate::crd::{Application, SpinnakerResource, SpinnakerResourceRef};
use async_trait::async_trait;
use kube::ResourceExt;
use serde_json::Value;

#[derive(Debug)]
pub struct ApplicationHandler {
    executor: TaskExecutor,
}

impl ApplicationHandler {
    #[must_use]
    pub fn new(executor: TaskExecutor) -> Self {
        Self { executor }
    }
}

/// The application document with `name` forced to the object name
fn application_document(resource: &Application) -> (String, Value) {
    let name = resource.name_any();
    let mut document = resource.document().clone();
    document.insert("name".to_string(), Value::String(name.clone()));
    (name, Value::Object(document))
}

fn job_type(operation: Operation) -> &'static str {
    match operation {
        Operation::Update => "updateApplication",
        Operation::Delete => "deleteApplication",
        Operation::Create | Operation::Publish => "createApplication",
    }
}

#[async_trait]
impl RemoteHandler<Application> for ApplicationHandler {
    fn operation_for(&self, change: Change) -> Option<Operation> {
        match change {
            Change::Initial => Some(Operation::Create),
            Change::Drift => Some(Operation::Update),
        }
    }

    async fn apply(
        &self,
        resource: &Application,
        operation: Operation,
        cancel: &CancelSignal,
    ) -> Result<Applied, ReconcilerError> {
        let (name, document) = application_document(resource);
        let task = application_task(&name, job_type(operation), document);
        let outcome = self
            .executor
            .run_task(operation, &name, &task, cancel)
            .await?;
        Ok(Applied {
            outcome,
            remote: SpinnakerResourceRef {
                application_name: Some(name),
                ..SpinnakerResourceRef::default()
            },
        })
    }

    async fn delete(
        &self,
        resource: &Application,
        cancel: &CancelSignal,
    ) -> Result<TaskOutcome, ReconcilerError> {
        let (name, document) = application_document(resource);
        let task = application_task(&name, job_type(Operation::Delete), document);
        Ok(self
            .executor
            .run_task(Operation::Delete, &name, &task, cancel)
            .await?)
    }
}
