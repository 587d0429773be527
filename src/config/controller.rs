//! # Controller Configuration
//!
//! Controller-level settings resolved from command-line flags and environment variables.

use crate::cli::Cli;
use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_EXPORT_NOT_FOUND_REQUEUE_SECS,
    DEFAULT_METRICS_PORT, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS,
    DEFAULT_SPINNAKER_ENDPOINT,
};
use std::time::Duration;

/// Controller-level configuration
///
/// All settings have sensible defaults; see [`Cli`] for the flag and environment
/// variable names.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL of Spinnaker Gate
    pub spinnaker_endpoint: String,
    /// Port for `/metrics`, `/healthz` and `/readyz`
    pub metrics_port: u16,
    /// Deadline for a remote task to reach a terminal state (0 = no deadline)
    pub poll_timeout_secs: u64,
    /// Pause between two task status checks
    pub poll_interval_secs: u64,
    /// Requeue delay when a template export does not exist yet
    pub export_retry_delay_secs: u64,
    /// Fibonacci backoff floor for reconciliation faults
    pub backoff_min_secs: u64,
    /// Fibonacci backoff ceiling for reconciliation faults
    pub backoff_max_secs: u64,
    /// Kinds to reconcile; empty means every registered kind
    pub enabled_kinds: Vec<String>,
    /// Debug-level logging
    pub verbose: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            spinnaker_endpoint: DEFAULT_SPINNAKER_ENDPOINT.to_string(),
            metrics_port: DEFAULT_METRICS_PORT,
            poll_timeout_secs: DEFAULT_POLL_TIMEOUT_SECS,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            export_retry_delay_secs: DEFAULT_EXPORT_NOT_FOUND_REQUEUE_SECS,
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            enabled_kinds: Vec::new(),
            verbose: false,
        }
    }
}

impl From<Cli> for ControllerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            spinnaker_endpoint: cli.spinnaker_endpoint.trim_end_matches('/').to_string(),
            metrics_port: cli.metrics_port,
            poll_timeout_secs: cli.poll_timeout_secs,
            poll_interval_secs: cli.poll_interval_secs,
            export_retry_delay_secs: cli.export_retry_delay_secs,
            backoff_min_secs: cli.backoff_min_secs.max(1),
            backoff_max_secs: cli.backoff_max_secs.max(cli.backoff_min_secs.max(1)),
            enabled_kinds: cli
                .kinds
                .into_iter()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
            verbose: cli.verbose,
        }
    }
}

impl ControllerConfig {
    /// Task poll deadline; `None` means poll until the task finishes
    #[must_use]
    pub fn poll_timeout(&self) -> Option<Duration> {
        (self.poll_timeout_secs > 0).then(|| Duration::from_secs(self.poll_timeout_secs))
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    #[must_use]
    pub fn export_retry_delay(&self) -> Duration {
        Duration::from_secs(self.export_retry_delay_secs)
    }

    /// Whether the controller for `kind` should run
    #[must_use]
    pub fn is_kind_enabled(&self, kind: &str) -> bool {
        self.enabled_kinds.is_empty()
            || self
                .enabled_kinds
                .iter()
                .any(|k| k.eq_ignore_ascii_case(kind))
    }
}
