//! Lifecycle integration tests
//!
//! Drive every resource kind through apply, steady state and deletion using
//! in-memory fakes for Spinnaker Gate, the export registry and the
//! Kubernetes store. The fake store enforces `resourceVersion` on finalizer
//! and status writes the same way the API server does.

use async_trait::async_trait;
use kube::ResourceExt;
use reqwest::StatusCode;
use serde_json::{json, Value};
use spinnaker_dcd_controller::constants::FINALIZER_NAME;
use spinnaker_dcd_controller::controller::reconciler::change::content_hash;
use spinnaker_dcd_controller::controller::reconciler::executor::TaskError;
use spinnaker_dcd_controller::controller::reconciler::kinds::{
    ApplicationHandler, CanaryConfigHandler, PipelineHandler, PipelineTemplateHandler,
};
use spinnaker_dcd_controller::controller::reconciler::lifecycle::{self, LifecycleState, Transition};
use spinnaker_dcd_controller::controller::reconciler::store::{
    EventKind, ResourceEvent, ResourceStore, StoreError,
};
use spinnaker_dcd_controller::controller::reconciler::{
    CancelSignal, Operation, PollSettings, ReconcilerError, TaskExecutor, TemplateResolver,
};
use spinnaker_dcd_controller::crd::{
    Application, CanaryConfig, Pipeline, PipelineTemplate, SpinnakerResource,
    SpinnakerResourceStatus,
};
use spinnaker_dcd_controller::exports::{Export, ExportPage, ExportRegistry, RegistryError};
use spinnaker_dcd_controller::spinnaker::{ExecutionResponse, GateApi, GateError, Task, TaskRef};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct FakeGate {
    calls: Mutex<Vec<String>>,
    tasks: Mutex<Vec<Task>>,
    bodies: Mutex<Vec<Value>>,
    task_status: Mutex<String>,
    canary_lookup: Mutex<StatusCode>,
    unavailable: AtomicBool,
}

impl FakeGate {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            tasks: Mutex::new(Vec::new()),
            bodies: Mutex::new(Vec::new()),
            task_status: Mutex::new("SUCCEEDED".to_string()),
            canary_lookup: Mutex::new(StatusCode::NOT_FOUND),
            unavailable: AtomicBool::new(false),
        })
    }

    fn finish_tasks_with(&self, status: &str) {
        *self.task_status.lock().unwrap() = status.to_string();
    }

    fn record(&self, call: String) -> Result<(), GateError> {
        self.calls.lock().unwrap().push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(GateError::UnexpectedStatus {
                operation: "fake",
                status: 503,
                body: "service unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn clear(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn next_task(&self) -> TaskRef {
        TaskRef::new(format!("/tasks/{}", self.calls.lock().unwrap().len()))
    }
}

#[async_trait]
impl GateApi for FakeGate {
    async fn submit_task(&self, application: &str, task: &Task) -> Result<TaskRef, GateError> {
        let job_type = task.job[0]["type"].as_str().unwrap_or_default().to_string();
        self.record(format!("submit_task {application} {job_type}"))?;
        self.tasks.lock().unwrap().push(task.clone());
        Ok(self.next_task())
    }

    async fn task_status(&self, task: &TaskRef) -> Result<ExecutionResponse, GateError> {
        self.record(format!("task_status {}", task.reference))?;
        Ok(ExecutionResponse {
            id: Some(task.id().to_string()),
            status: self.task_status.lock().unwrap().clone(),
            ..ExecutionResponse::default()
        })
    }

    async fn publish_template(
        &self,
        template: &Value,
        template_id: &str,
    ) -> Result<TaskRef, GateError> {
        self.record(format!("publish_template {template_id}"))?;
        self.bodies.lock().unwrap().push(template.clone());
        Ok(self.next_task())
    }

    async fn delete_template(&self, template_id: &str) -> Result<TaskRef, GateError> {
        self.record(format!("delete_template {template_id}"))?;
        Ok(self.next_task())
    }

    async fn save_pipeline(&self, pipeline: &Value) -> Result<(), GateError> {
        self.record("save_pipeline".to_string())?;
        self.bodies.lock().unwrap().push(pipeline.clone());
        Ok(())
    }

    async fn delete_pipeline(
        &self,
        application: &str,
        pipeline_name: &str,
    ) -> Result<(), GateError> {
        self.record(format!("delete_pipeline {application}/{pipeline_name}"))
    }

    async fn get_canary_config(&self, config_id: &str) -> Result<StatusCode, GateError> {
        self.record(format!("get_canary_config {config_id}"))?;
        Ok(*self.canary_lookup.lock().unwrap())
    }

    async fn create_canary_config(&self, config: &Value) -> Result<StatusCode, GateError> {
        self.record("create_canary_config".to_string())?;
        self.bodies.lock().unwrap().push(config.clone());
        Ok(StatusCode::OK)
    }

    async fn update_canary_config(
        &self,
        config_id: &str,
        config: &Value,
    ) -> Result<StatusCode, GateError> {
        self.record(format!("update_canary_config {config_id}"))?;
        self.bodies.lock().unwrap().push(config.clone());
        Ok(StatusCode::OK)
    }

    async fn delete_canary_config(&self, config_id: &str) -> Result<StatusCode, GateError> {
        self.record(format!("delete_canary_config {config_id}"))?;
        Ok(StatusCode::OK)
    }
}

struct PagedExports {
    pages: Vec<Vec<Export>>,
    calls: AtomicUsize,
}

impl PagedExports {
    fn new(pages: Vec<Vec<(&str, &str)>>) -> Arc<Self> {
        Arc::new(Self {
            pages: pages
                .into_iter()
                .map(|page| {
                    page.into_iter()
                        .map(|(name, value)| Export {
                            name: name.to_string(),
                            value: Some(value.to_string()),
                        })
                        .collect()
                })
                .collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ExportRegistry for PagedExports {
    async fn list_exports(&self, next_token: Option<String>) -> Result<ExportPage, RegistryError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let index: usize = next_token.map_or(0, |t| t.parse().unwrap());
        let next_token = (index + 1 < self.pages.len()).then(|| (index + 1).to_string());
        Ok(ExportPage {
            exports: self.pages.get(index).cloned().unwrap_or_default(),
            next_token,
        })
    }
}

/// In-memory object store with API-server-like `resourceVersion` handling
struct FakeStore<K> {
    stored: Mutex<K>,
    events: Mutex<Vec<ResourceEvent>>,
    status_writes: AtomicUsize,
}

fn bump<K: SpinnakerResource>(object: &mut K) {
    let version = object
        .resource_version()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(0);
    object.meta_mut().resource_version = Some((version + 1).to_string());
}

fn edit<K: SpinnakerResource>(object: &K, change: impl FnOnce(&mut Value)) -> K {
    let mut value = serde_json::to_value(object).unwrap();
    change(&mut value);
    serde_json::from_value(value).unwrap()
}

impl<K: SpinnakerResource> FakeStore<K> {
    fn new(resource: &K) -> Self {
        Self {
            stored: Mutex::new(resource.clone()),
            events: Mutex::new(Vec::new()),
            status_writes: AtomicUsize::new(0),
        }
    }

    fn current(&self) -> K {
        self.stored.lock().unwrap().clone()
    }

    /// Apply a write made by someone else (user edit, other controller)
    fn external_write(&self, change: impl FnOnce(&mut Value)) -> K {
        let mut stored = self.stored.lock().unwrap();
        let mut updated = edit(&*stored, change);
        bump(&mut updated);
        *stored = updated.clone();
        updated
    }

    fn request_deletion(&self) -> K {
        self.external_write(|v| {
            v["metadata"]["deletionTimestamp"] = json!("2024-01-01T00:00:00Z");
        })
    }

    fn status_writes(&self) -> usize {
        self.status_writes.load(Ordering::SeqCst)
    }

    fn events(&self) -> Vec<ResourceEvent> {
        self.events.lock().unwrap().clone()
    }

    fn write_finalizers(&self, resource: &K, finalizers: Vec<String>) -> Result<K, StoreError> {
        let mut stored = self.stored.lock().unwrap();
        if stored.resource_version() != resource.resource_version() {
            return Err(StoreError::Conflict {
                resource: resource.resource_key(),
                message: "the object has been modified".to_string(),
            });
        }
        stored.meta_mut().finalizers = Some(finalizers);
        bump(&mut *stored);
        Ok(stored.clone())
    }
}

#[async_trait]
impl<K: SpinnakerResource> ResourceStore<K> for FakeStore<K> {
    async fn add_finalizer(&self, resource: &K) -> Result<K, StoreError> {
        if resource.has_finalizer() {
            return Ok(resource.clone());
        }
        let mut finalizers = resource.finalizers().to_vec();
        finalizers.push(FINALIZER_NAME.to_string());
        self.write_finalizers(resource, finalizers)
    }

    async fn remove_finalizer(&self, resource: &K) -> Result<K, StoreError> {
        if !resource.has_finalizer() {
            return Ok(resource.clone());
        }
        let finalizers = resource
            .finalizers()
            .iter()
            .filter(|f| f.as_str() != FINALIZER_NAME)
            .cloned()
            .collect();
        self.write_finalizers(resource, finalizers)
    }

    async fn update_status(
        &self,
        resource: &K,
        status: &SpinnakerResourceStatus,
    ) -> Result<K, StoreError> {
        let status = serde_json::to_value(status).unwrap();
        let mut stored = self.stored.lock().unwrap();
        if stored.resource_version() != resource.resource_version() {
            return Err(StoreError::Conflict {
                resource: resource.resource_key(),
                message: "the object has been modified".to_string(),
            });
        }
        self.status_writes.fetch_add(1, Ordering::SeqCst);
        let mut updated = edit(&*stored, |v| v["status"] = status);
        bump(&mut updated);
        *stored = updated.clone();
        Ok(updated)
    }

    async fn publish_event(&self, _: &K, event: &ResourceEvent) -> Result<(), StoreError> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn executor(gate: &Arc<FakeGate>) -> TaskExecutor {
    TaskExecutor::new(
        gate.clone(),
        PollSettings {
            timeout: Some(Duration::from_secs(30)),
            interval: Duration::from_secs(1),
        },
    )
}

fn resource<K: SpinnakerResource>(kind: &str, metadata: Value, spec: Value) -> K {
    serde_json::from_value(json!({
        "apiVersion": "spinnaker.kaidotdev.github.io/v1",
        "kind": kind,
        "metadata": metadata,
        "spec": spec
    }))
    .unwrap()
}

fn application(spec: Value) -> Application {
    resource(
        "Application",
        json!({"name": "foo", "resourceVersion": "1"}),
        spec,
    )
}

fn observed<K: SpinnakerResource>(resource: &K) -> SpinnakerResourceStatus {
    resource.observed().cloned().unwrap_or_default()
}

fn no_cancel() -> CancelSignal {
    CancelSignal::never()
}

// ---------------------------------------------------------------------------
// Application
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_application_create_records_status_and_finalizer() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);

    let transition = lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(
        transition,
        Transition::Applied {
            operation: Operation::Create,
            succeeded: true
        }
    );
    assert_eq!(
        gate.calls(),
        vec!["submit_task foo createApplication", "task_status /tasks/1"]
    );
    let task = gate.tasks.lock().unwrap()[0].clone();
    assert_eq!(task.description, "Execute createApplication task: foo");
    assert_eq!(task.job[0]["application"]["name"], "foo");
    assert_eq!(task.job[0]["application"]["email"], "owner@example.com");

    let current = store.current();
    assert!(current.has_finalizer());
    let status = observed(&current);
    assert_eq!(status.hash, content_hash(app.document()));
    assert_eq!(status.spinnaker_resource.application_name.as_deref(), Some("foo"));
    assert_eq!(status.conditions.len(), 1);
    assert_eq!(status.conditions[0].r#type, "CreationComplete");
    assert_eq!(status.conditions[0].status, "True");
    assert_eq!(LifecycleState::of(&current), LifecycleState::Ready);

    let events = store.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Normal);
    assert_eq!(events[0].reason, "SuccessfulCreated");
    assert_eq!(events[0].note, "Created Application: \"foo\"");
}

#[tokio::test]
async fn test_unchanged_application_is_not_resubmitted() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap();
    gate.clear();

    let current = store.current();
    let transition = lifecycle::run(&current, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(transition, Transition::Unchanged);
    assert!(gate.calls().is_empty());
    assert_eq!(store.status_writes(), 1);
    assert_eq!(observed(&store.current()).conditions.len(), 1);
}

#[tokio::test]
async fn test_application_update_rejected_keeps_history() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap();
    let first_condition = observed(&store.current()).conditions[0].clone();

    gate.clear();
    gate.finish_tasks_with("TERMINAL");
    let edited = store.external_write(|v| v["spec"]["email"] = json!("team@example.com"));
    let transition = lifecycle::run(&edited, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(
        transition,
        Transition::Applied {
            operation: Operation::Update,
            succeeded: false
        }
    );
    assert_eq!(gate.calls()[0], "submit_task foo updateApplication");

    let current = store.current();
    let status = observed(&current);
    assert_eq!(status.hash, content_hash(edited.document()));
    assert_eq!(status.conditions.len(), 2);
    assert_eq!(status.conditions[0], first_condition);
    assert_eq!(status.conditions[1].r#type, "UpdateComplete");
    assert_eq!(status.conditions[1].status, "False");
    assert_eq!(status.conditions[1].reason.as_deref(), Some("UpdateFailed"));
    assert!(current.has_finalizer());
    assert_eq!(LifecycleState::of(&current), LifecycleState::Failed);
    assert_eq!(store.events()[1].kind, EventKind::Warning);

    // The rejected spec is not resubmitted until it changes again
    gate.clear();
    let transition = lifecycle::run(&current, &handler, &store, &no_cancel()).await.unwrap();
    assert_eq!(transition, Transition::Unchanged);
    assert!(gate.calls().is_empty());
}

#[tokio::test]
async fn test_application_delete_releases_finalizer() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap();

    gate.clear();
    let deleting = store.request_deletion();
    let transition = lifecycle::run(&deleting, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(transition, Transition::Deleted { succeeded: true });
    assert_eq!(gate.calls()[0], "submit_task foo deleteApplication");

    let current = store.current();
    assert!(!current.has_finalizer());
    let status = observed(&current);
    assert_eq!(status.conditions.len(), 2);
    assert_eq!(status.conditions[1].r#type, "DeletionComplete");
    assert_eq!(status.conditions[1].status, "True");
    assert_eq!(LifecycleState::of(&current), LifecycleState::Removed);
    assert_eq!(store.events()[1].reason, "SuccessfulDeleted");

    // Nothing left to do once the finalizer is gone
    gate.clear();
    let transition = lifecycle::run(&current, &handler, &store, &no_cancel()).await.unwrap();
    assert_eq!(transition, Transition::Removed);
    assert!(gate.calls().is_empty());
}

#[tokio::test]
async fn test_delete_before_create_makes_no_remote_call() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    let deleting = store.request_deletion();

    let transition = lifecycle::run(&deleting, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(transition, Transition::Removed);
    assert!(gate.calls().is_empty());
    assert_eq!(store.status_writes(), 0);
    assert!(!store.current().has_finalizer());
}

#[tokio::test]
async fn test_rejected_delete_still_releases_finalizer() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap();

    gate.finish_tasks_with("TERMINAL");
    let deleting = store.request_deletion();
    let transition = lifecycle::run(&deleting, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(transition, Transition::Deleted { succeeded: false });
    let current = store.current();
    assert!(!current.has_finalizer());
    let status = observed(&current);
    assert_eq!(status.conditions[1].status, "False");
    assert_eq!(status.conditions[1].reason.as_deref(), Some("DeleteFailed"));
}

#[tokio::test]
async fn test_submit_fault_leaves_resource_untouched() {
    let gate = FakeGate::new();
    gate.unavailable.store(true, Ordering::SeqCst);
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);

    let err = lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcilerError::Task(TaskError::Submit {
            operation: Operation::Create,
            ..
        })
    ));
    assert_eq!(err.metric_label(), "gate");
    let current = store.current();
    assert!(!current.has_finalizer());
    assert!(current.observed().is_none());
    assert_eq!(store.status_writes(), 0);
    assert!(store.events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_poll_timeout_leaves_resource_untouched() {
    let gate = FakeGate::new();
    gate.finish_tasks_with("RUNNING");
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);

    let err = lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Task(TaskError::Timeout { .. })));
    assert_eq!(err.metric_label(), "task_timeout");
    assert!(!store.current().has_finalizer());
    assert_eq!(store.status_writes(), 0);
}

#[tokio::test]
async fn test_cancelled_poll_leaves_resource_untouched() {
    let gate = FakeGate::new();
    gate.finish_tasks_with("RUNNING");
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    let (handle, signal) = CancelSignal::channel();
    handle.cancel();

    let err = lifecycle::run(&app, &handler, &store, &signal).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Task(TaskError::Cancelled { .. })));
    assert_eq!(gate.calls(), vec!["submit_task foo createApplication"]);
    assert_eq!(store.status_writes(), 0);
}

#[tokio::test]
async fn test_conflicting_write_fails_the_step() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    // Someone else writes between our read and our finalizer patch
    store.external_write(|v| v["metadata"]["labels"] = json!({"team": "platform"}));

    let err = lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Store(StoreError::Conflict { .. })));
    assert_eq!(err.metric_label(), "conflict");
    assert!(!store.current().has_finalizer());
    assert_eq!(store.status_writes(), 0);

    // The next attempt starts from the fresh object and succeeds
    let current = store.current();
    let transition = lifecycle::run(&current, &handler, &store, &no_cancel()).await.unwrap();
    assert!(matches!(transition, Transition::Applied { succeeded: true, .. }));
    assert!(store.current().has_finalizer());
    assert_eq!(store.current().labels().get("team").map(String::as_str), Some("platform"));
}

#[tokio::test]
async fn test_stale_copy_fails_status_write_and_keeps_history() {
    let gate = FakeGate::new();
    let handler = ApplicationHandler::new(executor(&gate));
    let app = application(json!({"email": "owner@example.com"}));
    let store = FakeStore::new(&app);
    lifecycle::run(&app, &handler, &store, &no_cancel()).await.unwrap();
    let recorded = observed(&store.current());

    // A lagging cache still serves the object from before the status write
    let stale = edit(&store.current(), |v| {
        v["metadata"]["resourceVersion"] = json!("2");
        v.as_object_mut().unwrap().remove("status");
    });
    assert!(stale.has_finalizer());

    let err = lifecycle::run(&stale, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::Store(StoreError::Conflict { .. })));
    assert_eq!(store.status_writes(), 1);
    let status = observed(&store.current());
    assert_eq!(status, recorded);
    assert_eq!(status.conditions.len(), 1);
    assert_eq!(status.conditions[0].r#type, "CreationComplete");
}

// ---------------------------------------------------------------------------
// PipelineTemplate
// ---------------------------------------------------------------------------

fn template(spec: Value) -> PipelineTemplate {
    resource(
        "PipelineTemplate",
        json!({"name": "base", "resourceVersion": "1"}),
        spec,
    )
}

#[tokio::test]
async fn test_template_publish_resolves_exports() {
    let gate = FakeGate::new();
    let exports = PagedExports::new(vec![
        vec![("Other", "x")],
        vec![("ExportA", "account-a")],
    ]);
    let handler = PipelineTemplateHandler::new(executor(&gate), TemplateResolver::new(exports.clone()));
    let tpl = template(json!({
        "id": "base",
        "schema": "v2",
        "variables": [{"name": "account", "defaultValue": "${ImportValue:ExportA}"}],
        "stages": [{"expression": "${trigger.tag}"}]
    }));
    let store = FakeStore::new(&tpl);

    let transition = lifecycle::run(&tpl, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(
        transition,
        Transition::Applied {
            operation: Operation::Publish,
            succeeded: true
        }
    );
    assert_eq!(gate.calls(), vec!["publish_template base", "task_status /tasks/1"]);
    assert_eq!(exports.calls.load(Ordering::SeqCst), 2);
    let published = gate.bodies.lock().unwrap()[0].clone();
    assert_eq!(published["variables"][0]["defaultValue"], "account-a");
    assert_eq!(published["stages"][0]["expression"], "${trigger.tag}");

    let current = store.current();
    let status = observed(&current);
    // Hash covers the unresolved spec
    assert_eq!(status.hash, content_hash(tpl.document()));
    assert_eq!(status.spinnaker_resource.id.as_deref(), Some("base"));
    assert_eq!(status.conditions[0].r#type, "PublishingComplete");
    assert_eq!(store.events()[0].reason, "SuccessfulPublished");

    // Edits are republished, never "updated"
    gate.clear();
    let edited = store.external_write(|v| v["spec"]["schema"] = json!("v2.1"));
    let transition = lifecycle::run(&edited, &handler, &store, &no_cancel()).await.unwrap();
    assert!(matches!(
        transition,
        Transition::Applied { operation: Operation::Publish, .. }
    ));
    assert_eq!(observed(&store.current()).conditions.len(), 2);
}

#[tokio::test]
async fn test_template_missing_export_is_retryable_and_untouched() {
    let gate = FakeGate::new();
    let exports = PagedExports::new(vec![vec![("Other", "x")]]);
    let handler = PipelineTemplateHandler::new(executor(&gate), TemplateResolver::new(exports));
    let tpl = template(json!({"id": "t", "value": "${ImportValue:ExportA}"}));
    let store = FakeStore::new(&tpl);

    let err = lifecycle::run(&tpl, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(err.is_export_not_found());
    assert_eq!(err.metric_label(), "export_not_found");
    assert!(gate.calls().is_empty());
    assert_eq!(store.status_writes(), 0);
    assert!(store.current().observed().is_none());
}

#[tokio::test]
async fn test_template_without_id_is_malformed() {
    let gate = FakeGate::new();
    let handler = PipelineTemplateHandler::new(
        executor(&gate),
        TemplateResolver::new(PagedExports::new(vec![])),
    );
    let tpl = template(json!({"schema": "v2"}));
    let store = FakeStore::new(&tpl);

    let err = lifecycle::run(&tpl, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::MalformedSpec { kind: "PipelineTemplate", .. }));
    assert!(gate.calls().is_empty());
    assert_eq!(store.status_writes(), 0);
}

#[tokio::test]
async fn test_template_delete_uses_recorded_id() {
    let gate = FakeGate::new();
    let handler = PipelineTemplateHandler::new(
        executor(&gate),
        TemplateResolver::new(PagedExports::new(vec![])),
    );
    let tpl = template(json!({"id": "base"}));
    let store = FakeStore::new(&tpl);
    lifecycle::run(&tpl, &handler, &store, &no_cancel()).await.unwrap();

    gate.clear();
    let deleting = store.request_deletion();
    let transition = lifecycle::run(&deleting, &handler, &store, &no_cancel()).await.unwrap();

    assert_eq!(transition, Transition::Deleted { succeeded: true });
    assert_eq!(gate.calls()[0], "delete_template base");
    assert!(!store.current().has_finalizer());
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

fn pipeline(spec: Value) -> Pipeline {
    resource(
        "Pipeline",
        json!({"name": "deploy", "namespace": "apps", "resourceVersion": "1"}),
        spec,
    )
}

#[tokio::test]
async fn test_pipeline_create_drift_and_delete() {
    let gate = FakeGate::new();
    let handler = PipelineHandler::new(gate.clone());
    let p = pipeline(json!({"application": "foo", "name": "deploy", "stages": []}));
    let store = FakeStore::new(&p);

    let transition = lifecycle::run(&p, &handler, &store, &no_cancel()).await.unwrap();
    assert_eq!(
        transition,
        Transition::Applied {
            operation: Operation::Create,
            succeeded: true
        }
    );
    assert_eq!(gate.calls(), vec!["save_pipeline"]);
    let status = observed(&store.current());
    assert_eq!(status.spinnaker_resource.application_name.as_deref(), Some("foo"));
    assert_eq!(status.spinnaker_resource.name.as_deref(), Some("deploy"));

    // Pipelines are never updated in place
    gate.clear();
    let edited = store.external_write(|v| v["spec"]["name"] = json!("deploy-v2"));
    let transition = lifecycle::run(&edited, &handler, &store, &no_cancel()).await.unwrap();
    assert_eq!(transition, Transition::DriftIgnored);
    assert!(gate.calls().is_empty());

    // Deletion targets the pipeline that was actually created
    let deleting = store.request_deletion();
    let transition = lifecycle::run(&deleting, &handler, &store, &no_cancel()).await.unwrap();
    assert_eq!(transition, Transition::Deleted { succeeded: true });
    assert_eq!(gate.calls(), vec!["delete_pipeline foo/deploy"]);
    assert!(!store.current().has_finalizer());
}

#[tokio::test]
async fn test_pipeline_without_application_is_malformed() {
    let gate = FakeGate::new();
    let handler = PipelineHandler::new(gate.clone());
    let p = pipeline(json!({"name": "deploy"}));
    let store = FakeStore::new(&p);

    let err = lifecycle::run(&p, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::MalformedSpec { kind: "Pipeline", .. }));
    assert!(gate.calls().is_empty());
    assert_eq!(store.status_writes(), 0);
}

// ---------------------------------------------------------------------------
// CanaryConfig
// ---------------------------------------------------------------------------

fn canary_config(spec: Value) -> CanaryConfig {
    resource(
        "CanaryConfig",
        json!({"name": "latency", "resourceVersion": "1"}),
        spec,
    )
}

#[tokio::test]
async fn test_canary_config_create_then_update() {
    let gate = FakeGate::new();
    let handler = CanaryConfigHandler::new(gate.clone());
    let config = canary_config(json!({"id": "c1", "name": "latency", "metrics": []}));
    let store = FakeStore::new(&config);

    let transition = lifecycle::run(&config, &handler, &store, &no_cancel()).await.unwrap();
    assert!(matches!(
        transition,
        Transition::Applied { operation: Operation::Create, succeeded: true }
    ));
    assert_eq!(gate.calls(), vec!["get_canary_config c1", "create_canary_config"]);
    assert_eq!(
        observed(&store.current()).spinnaker_resource.id.as_deref(),
        Some("c1")
    );

    gate.clear();
    *gate.canary_lookup.lock().unwrap() = StatusCode::OK;
    let edited = store.external_write(|v| v["spec"]["metrics"] = json!([{"name": "p99"}]));
    let transition = lifecycle::run(&edited, &handler, &store, &no_cancel()).await.unwrap();
    assert!(matches!(
        transition,
        Transition::Applied { operation: Operation::Update, succeeded: true }
    ));
    assert_eq!(gate.calls(), vec!["get_canary_config c1", "update_canary_config c1"]);
    assert_eq!(observed(&store.current()).conditions.len(), 2);

    gate.clear();
    let deleting = store.request_deletion();
    let transition = lifecycle::run(&deleting, &handler, &store, &no_cancel()).await.unwrap();
    assert_eq!(transition, Transition::Deleted { succeeded: true });
    assert_eq!(gate.calls(), vec!["delete_canary_config c1"]);
}

#[tokio::test]
async fn test_canary_config_lookup_failure_is_fatal() {
    let gate = FakeGate::new();
    *gate.canary_lookup.lock().unwrap() = StatusCode::INTERNAL_SERVER_ERROR;
    let handler = CanaryConfigHandler::new(gate.clone());
    let config = canary_config(json!({"id": "c1"}));
    let store = FakeStore::new(&config);

    let err = lifecycle::run(&config, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(
        err,
        ReconcilerError::Gate(GateError::UnexpectedStatus { status: 500, .. })
    ));
    assert_eq!(gate.calls(), vec!["get_canary_config c1"]);
    assert_eq!(store.status_writes(), 0);
    assert!(!store.current().has_finalizer());
}

#[tokio::test]
async fn test_canary_config_without_id_is_malformed() {
    let gate = FakeGate::new();
    let handler = CanaryConfigHandler::new(gate.clone());
    let config = canary_config(json!({"name": "latency"}));
    let store = FakeStore::new(&config);

    let err = lifecycle::run(&config, &handler, &store, &no_cancel()).await.unwrap_err();

    assert!(matches!(err, ReconcilerError::MalformedSpec { kind: "CanaryConfig", .. }));
    assert!(gate.calls().is_empty());
}
