//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! command-line flags or environment variables where applicable.

/// API group of every custom resource managed by this controller
pub const API_GROUP: &str = "spinnaker.kaidotdev.github.io";

/// Guard token attached once a remote object exists and removed after remote cleanup
pub const FINALIZER_NAME: &str = "spinnaker.kaidotdev.github.io/finalizer";

/// Name reported on Kubernetes Events and used as the field manager
pub const CONTROLLER_NAME: &str = "spinnaker-dcd-controller";

/// Default Spinnaker Gate endpoint (in-cluster service)
pub const DEFAULT_SPINNAKER_ENDPOINT: &str = "http://spin-gate.spinnaker.svc.cluster.local:8084";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default deadline for a remote task to reach a terminal state (seconds, 0 = none)
pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Default pause between two task status checks (seconds)
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

/// Fixed requeue delay when a template references an export that does not exist yet (seconds)
pub const DEFAULT_EXPORT_NOT_FOUND_REQUEUE_SECS: u64 = 60;

/// Fibonacci backoff floor for reconciliation faults (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 1;

/// Fibonacci backoff ceiling for reconciliation faults (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;

/// Task statuses after which Spinnaker will not update an execution any more
pub const COMPLETED_TASK_STATUSES: &[&str] = &[
    "SUCCEEDED",
    "TERMINAL",
    "STOPPED",
    "CANCELED",
    "SKIPPED",
    "FAILED_CONTINUE",
];

/// The only completed task status that means the remote operation failed
pub const TERMINAL_TASK_STATUS: &str = "TERMINAL";

/// Pause before restarting a controller whose watch stream ended unexpectedly (seconds)
pub const WATCH_RESTART_DELAY_SECS: u64 = 5;
