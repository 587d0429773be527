//! Spinnaker Gate REST Client
//!
//! Native REST implementation of [`GateApi`] on top of reqwest (rustls).
//!
//! References:
//! - [Gate API](https://spinnaker.io/docs/reference/api/docsapi/)

use super::{ExecutionResponse, GateApi, GateError, Task, TaskRef};
use crate::observability::metrics;
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

/// Spinnaker Gate REST client
#[derive(Clone)]
pub struct GateClient {
    http_client: Client,
    base_url: String,
}

impl std::fmt::Debug for GateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GateClient {
    /// Create a client for the Gate instance at `base_url`
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(base_url: &str) -> Result<Self, GateError> {
        let http_client = Client::builder().build()?;
        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a request and return the raw response, recording metrics
    async fn send(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<reqwest::Response, GateError> {
        let url = self.url(path);
        let span = info_span!("spinnaker.gate.request", operation, http.method = %method, http.url = %url);
        let start = Instant::now();

        let mut request = self
            .http_client
            .request(method, &url)
            .header("Accept", "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let result = request.send().instrument(span).await;
        metrics::observe_gate_request(operation, start.elapsed().as_secs_f64(), result.is_ok());
        let response = result?;
        debug!(operation, status = %response.status(), "gate.response");
        Ok(response)
    }

    /// Send a request that must succeed with a JSON body
    async fn send_json<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<T, GateError> {
        let response = self.send(operation, method, path, body).await?;
        let response = ensure_success(operation, response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| GateError::InvalidResponse {
            operation,
            reason: format!("{e}: {text}"),
        })
    }
}

async fn ensure_success(
    operation: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response, GateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GateError::UnexpectedStatus {
        operation,
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl GateApi for GateClient {
    async fn submit_task(&self, application: &str, task: &Task) -> Result<TaskRef, GateError> {
        let body = serde_json::to_value(task).map_err(|e| GateError::InvalidResponse {
            operation: "submit_task",
            reason: e.to_string(),
        })?;
        self.send_json(
            "submit_task",
            Method::POST,
            &format!("/applications/{application}/tasks"),
            Some(&body),
        )
        .await
    }

    async fn task_status(&self, task: &TaskRef) -> Result<ExecutionResponse, GateError> {
        let path = if task.reference.starts_with('/') || task.reference.starts_with("http") {
            task.reference.clone()
        } else {
            format!("/tasks/{}", task.reference)
        };
        self.send_json("task_status", Method::GET, &path, None).await
    }

    async fn publish_template(
        &self,
        template: &Value,
        template_id: &str,
    ) -> Result<TaskRef, GateError> {
        let existing = self
            .send(
                "get_template",
                Method::GET,
                &format!("/pipelineTemplates/{template_id}"),
                None,
            )
            .await?;

        match existing.status() {
            StatusCode::NOT_FOUND => {
                self.send_json(
                    "create_template",
                    Method::POST,
                    "/pipelineTemplates",
                    Some(template),
                )
                .await
            }
            status if status.is_success() => {
                self.send_json(
                    "update_template",
                    Method::POST,
                    &format!("/pipelineTemplates/{template_id}"),
                    Some(template),
                )
                .await
            }
            status => Err(GateError::UnexpectedStatus {
                operation: "get_template",
                status: status.as_u16(),
                body: existing.text().await.unwrap_or_default(),
            }),
        }
    }

    async fn delete_template(&self, template_id: &str) -> Result<TaskRef, GateError> {
        self.send_json(
            "delete_template",
            Method::DELETE,
            &format!("/pipelineTemplates/{template_id}"),
            None,
        )
        .await
    }

    async fn save_pipeline(&self, pipeline: &Value) -> Result<(), GateError> {
        let response = self
            .send("save_pipeline", Method::POST, "/pipelines", Some(pipeline))
            .await?;
        ensure_success("save_pipeline", response).await?;
        Ok(())
    }

    async fn delete_pipeline(
        &self,
        application: &str,
        pipeline_name: &str,
    ) -> Result<(), GateError> {
        let response = self
            .send(
                "delete_pipeline",
                Method::DELETE,
                &format!("/pipelines/{application}/{pipeline_name}"),
                None,
            )
            .await?;
        ensure_success("delete_pipeline", response).await?;
        Ok(())
    }

    async fn get_canary_config(&self, config_id: &str) -> Result<StatusCode, GateError> {
        let response = self
            .send(
                "get_canary_config",
                Method::GET,
                &format!("/v2/canaryConfig/{config_id}"),
                None,
            )
            .await?;
        Ok(response.status())
    }

    async fn create_canary_config(&self, config: &Value) -> Result<StatusCode, GateError> {
        let response = self
            .send(
                "create_canary_config",
                Method::POST,
                "/v2/canaryConfig",
                Some(config),
            )
            .await?;
        Ok(response.status())
    }

    async fn update_canary_config(
        &self,
        config_id: &str,
        config: &Value,
    ) -> Result<StatusCode, GateError> {
        let response = self
            .send(
                "update_canary_config",
                Method::PUT,
                &format!("/v2/canaryConfig/{config_id}"),
                Some(config),
            )
            .await?;
        Ok(response.status())
    }

    async fn delete_canary_config(&self, config_id: &str) -> Result<StatusCode, GateError> {
        let response = self
            .send(
                "delete_canary_config",
                Method::DELETE,
                &format!("/v2/canaryConfig/{config_id}"),
                None,
            )
            .await?;
        Ok(response.status())
    }
}
