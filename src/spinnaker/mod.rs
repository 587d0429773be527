//! # Spinnaker Gate
//!
//! Abstract interface to the Spinnaker API gateway plus its HTTP implementation.
//!
//! The trait lets the reconciliation core run against the real Gate in
//! production and against in-memory fakes in tests.

mod client;
mod error;
mod types;

pub use client::GateClient;
pub use error::GateError;
pub use types::{ExecutionResponse, Task, TaskRef};

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

/// Operations the controller consumes from Spinnaker Gate
#[async_trait]
pub trait GateApi: Send + Sync {
    /// Submit an orchestration task for `application`; returns immediately
    async fn submit_task(&self, application: &str, task: &Task) -> Result<TaskRef, GateError>;

    /// Fetch the current state of a submitted task (single attempt)
    async fn task_status(&self, task: &TaskRef) -> Result<ExecutionResponse, GateError>;

    /// Create or update a pipeline template; returns the publishing task
    async fn publish_template(
        &self,
        template: &Value,
        template_id: &str,
    ) -> Result<TaskRef, GateError>;

    /// Delete a pipeline template; returns the deletion task
    async fn delete_template(&self, template_id: &str) -> Result<TaskRef, GateError>;

    /// Save (create or overwrite) a pipeline configuration
    async fn save_pipeline(&self, pipeline: &Value) -> Result<(), GateError>;

    /// Delete a pipeline by application and pipeline name
    async fn delete_pipeline(&self, application: &str, pipeline_name: &str)
        -> Result<(), GateError>;

    /// `GET /v2/canaryConfig/{id}`; 404 means the config does not exist yet
    async fn get_canary_config(&self, config_id: &str) -> Result<StatusCode, GateError>;

    /// `POST /v2/canaryConfig`
    async fn create_canary_config(&self, config: &Value) -> Result<StatusCode, GateError>;

    /// `PUT /v2/canaryConfig/{id}`
    async fn update_canary_config(
        &self,
        config_id: &str,
        config: &Value,
    ) -> Result<StatusCode, GateError>;

    /// `DELETE /v2/canaryConfig/{id}`
    async fn delete_canary_config(&self, config_id: &str) -> Result<StatusCode, GateError>;
}
