//! # Task Executor
//!
//! Submits orchestration tasks to Spinnaker and waits for them to reach a
//! terminal state.
//!
//! Spinnaker runs tasks asynchronously: submission returns a reference right
//! away and the outcome is discovered by polling `GET {ref}`. Polling sleeps
//! between checks, stops at an optional deadline and aborts as soon as the
//! surrounding [`CancelSignal`] fires.
//!
//! A `TERMINAL` task is a successfully observed outcome, not an error. Only
//! submission faults, polling faults, timeouts and cancellation surface as
//! [`TaskError`].

use crate::observability::metrics;
use crate::spinnaker::{ExecutionResponse, GateApi, GateError, Task, TaskRef};
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Kind of remote mutation being performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Create,
    Update,
    Delete,
    Publish,
}

impl Operation {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Publish => "publish",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal status of a remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalStatus {
    Succeeded,
    /// The operation ran and Spinnaker rejected it
    Terminal,
}

/// Observed outcome of a remote operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskOutcome {
    pub status: TerminalStatus,
    pub details: String,
}

impl TaskOutcome {
    #[must_use]
    pub fn succeeded(details: impl Into<String>) -> Self {
        Self {
            status: TerminalStatus::Succeeded,
            details: details.into(),
        }
    }

    #[must_use]
    pub fn terminal(details: impl Into<String>) -> Self {
        Self {
            status: TerminalStatus::Terminal,
            details: details.into(),
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == TerminalStatus::Succeeded
    }

    fn from_execution(execution: &ExecutionResponse) -> Self {
        let details = format!(
            "task {} finished with status {}",
            execution.id.as_deref().unwrap_or("<unknown>"),
            execution.status
        );
        if execution.is_terminal() {
            Self::terminal(details)
        } else {
            Self::succeeded(details)
        }
    }
}

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("failed to submit {operation} task: {source}")]
    Submit {
        operation: Operation,
        #[source]
        source: GateError,
    },
    #[error("failed to poll task {task}: {source}")]
    Poll {
        task: TaskRef,
        #[source]
        source: GateError,
    },
    #[error("task {task} did not complete within {}s", after.as_secs())]
    Timeout { task: TaskRef, after: Duration },
    #[error("waiting for task {task} was cancelled")]
    Cancelled { task: TaskRef },
}

/// Cooperative cancellation passed down into task polling
///
/// Cloned freely; every clone observes the same [`CancelHandle`].
#[derive(Debug, Clone)]
pub struct CancelSignal {
    receiver: watch::Receiver<bool>,
}

/// Fires the [`CancelSignal`]s created alongside it
#[derive(Debug)]
pub struct CancelHandle {
    sender: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Fails only when every signal has been dropped
        let _ = self.sender.send(true);
    }
}

impl CancelSignal {
    #[must_use]
    pub fn channel() -> (CancelHandle, CancelSignal) {
        let (sender, receiver) = watch::channel(false);
        (CancelHandle { sender }, CancelSignal { receiver })
    }

    /// A signal that never fires
    #[must_use]
    pub fn never() -> Self {
        Self::channel().1
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once cancellation is requested; pends forever if it never can be
    pub async fn cancelled(&mut self) {
        loop {
            if *self.receiver.borrow_and_update() {
                return;
            }
            if self.receiver.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Poll cadence for submitted tasks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// `None` polls until the task completes
    pub timeout: Option<Duration>,
    pub interval: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(crate::constants::DEFAULT_POLL_TIMEOUT_SECS)),
            interval: Duration::from_secs(crate::constants::DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

/// Build the orchestration task Spinnaker expects for `job_type`
///
/// The job embeds the application document under `application`.
#[must_use]
pub fn application_task(application: &str, job_type: &str, document: Value) -> Task {
    Task {
        application: application.to_string(),
        description: format!("Execute {job_type} task: {application}"),
        job: vec![json!({
            "type": job_type,
            "application": document,
        })],
    }
}

/// Submits tasks and waits for their terminal state
#[derive(Clone)]
pub struct TaskExecutor {
    gate: Arc<dyn GateApi>,
    settings: PollSettings,
}

impl std::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl TaskExecutor {
    #[must_use]
    pub fn new(gate: Arc<dyn GateApi>, settings: PollSettings) -> Self {
        Self { gate, settings }
    }

    #[must_use]
    pub fn gate(&self) -> &Arc<dyn GateApi> {
        &self.gate
    }

    /// Submit an orchestration task for `application`
    ///
    /// # Errors
    /// Returns [`TaskError::Submit`] if Gate does not accept the task
    pub async fn submit(
        &self,
        operation: Operation,
        application: &str,
        task: &Task,
    ) -> Result<TaskRef, TaskError> {
        self.gate
            .submit_task(application, task)
            .await
            .map_err(|source| TaskError::Submit { operation, source })
    }

    /// Submit an orchestration task and wait for it to finish
    ///
    /// # Errors
    /// Returns an error if submission or polling cannot complete
    pub async fn run_task(
        &self,
        operation: Operation,
        application: &str,
        task: &Task,
        cancel: &CancelSignal,
    ) -> Result<TaskOutcome, TaskError> {
        let task_ref = self.submit(operation, application, task).await?;
        info!(%operation, application, task = %task_ref, "task.submitted");
        self.poll(&task_ref, cancel).await
    }

    /// Await an arbitrary submission that yields a task reference, then poll it
    ///
    /// Used for Gate endpoints that start tasks on their own, such as
    /// template publishing.
    ///
    /// # Errors
    /// Returns an error if submission or polling cannot complete
    pub async fn execute<F>(
        &self,
        operation: Operation,
        submission: F,
        cancel: &CancelSignal,
    ) -> Result<TaskOutcome, TaskError>
    where
        F: Future<Output = Result<TaskRef, GateError>> + Send,
    {
        let task_ref = submission
            .await
            .map_err(|source| TaskError::Submit { operation, source })?;
        info!(%operation, task = %task_ref, "task.submitted");
        self.poll(&task_ref, cancel).await
    }

    /// Wait until `task` completes, the deadline passes or `cancel` fires
    ///
    /// Each iteration performs exactly one status check. The last check
    /// happens at the deadline itself.
    ///
    /// # Errors
    /// Returns an error on polling faults, timeout or cancellation
    pub async fn poll(
        &self,
        task: &TaskRef,
        cancel: &CancelSignal,
    ) -> Result<TaskOutcome, TaskError> {
        let started = Instant::now();
        let deadline = self.settings.timeout.map(|timeout| started + timeout);
        let mut cancel = cancel.clone();

        loop {
            if cancel.is_cancelled() {
                warn!(task = %task, "task.poll.cancelled");
                return Err(TaskError::Cancelled { task: task.clone() });
            }

            metrics::increment_task_polls();
            let execution = self
                .gate
                .task_status(task)
                .await
                .map_err(|source| TaskError::Poll {
                    task: task.clone(),
                    source,
                })?;

            if execution.is_completed() {
                let waited = started.elapsed();
                metrics::observe_task_wait_duration(waited.as_secs_f64());
                debug!(task = %task, status = %execution.status, waited_ms = waited.as_millis(), "task.completed");
                return Ok(TaskOutcome::from_execution(&execution));
            }

            let wait = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        warn!(task = %task, status = %execution.status, "task.poll.timeout");
                        return Err(TaskError::Timeout {
                            task: task.clone(),
                            after: started.elapsed(),
                        });
                    }
                    self.settings.interval.min(deadline - now)
                }
                None => self.settings.interval,
            };

            tokio::select! {
                () = tokio::time::sleep(wait) => {}
                () = cancel.cancelled() => {
                    warn!(task = %task, "task.poll.cancelled");
                    return Err(TaskError::Cancelled { task: task.clone() });
                }
            }
        }
    }
}
