//! # Command-Line Arguments
//!
//! Flags accepted by the controller binary. Every flag can also be supplied
//! through an environment variable so the deployment can use `envFrom`.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_EXPORT_NOT_FOUND_REQUEUE_SECS,
    DEFAULT_METRICS_PORT, DEFAULT_POLL_INTERVAL_SECS, DEFAULT_POLL_TIMEOUT_SECS,
    DEFAULT_SPINNAKER_ENDPOINT,
};
use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "spinnaker-dcd-controller",
    version,
    about = "Reconciles Spinnaker resources declared as Kubernetes custom resources"
)]
pub struct Cli {
    /// The endpoint of Spinnaker Gate
    #[arg(long, env = "SPINNAKER_ENDPOINT", default_value = DEFAULT_SPINNAKER_ENDPOINT)]
    pub spinnaker_endpoint: String,

    /// Port the metrics and probe endpoints bind to
    #[arg(long, env = "METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// How long to wait for a Spinnaker task to finish (0 waits forever)
    #[arg(long, env = "POLL_TIMEOUT_SECS", default_value_t = DEFAULT_POLL_TIMEOUT_SECS)]
    pub poll_timeout_secs: u64,

    /// Pause between two task status checks
    #[arg(long, env = "POLL_INTERVAL_SECS", default_value_t = DEFAULT_POLL_INTERVAL_SECS)]
    pub poll_interval_secs: u64,

    /// Requeue delay when a template references an export that does not exist yet
    #[arg(
        long,
        env = "EXPORT_RETRY_DELAY_SECS",
        default_value_t = DEFAULT_EXPORT_NOT_FOUND_REQUEUE_SECS
    )]
    pub export_retry_delay_secs: u64,

    /// First retry delay after a reconciliation fault
    #[arg(long, env = "BACKOFF_MIN_SECS", default_value_t = DEFAULT_BACKOFF_MIN_SECS)]
    pub backoff_min_secs: u64,

    /// Upper bound of the retry delay after repeated faults
    #[arg(long, env = "BACKOFF_MAX_SECS", default_value_t = DEFAULT_BACKOFF_MAX_SECS)]
    pub backoff_max_secs: u64,

    /// Resource kinds to reconcile (comma separated). Defaults to every kind.
    #[arg(long, env = "ENABLED_KINDS", value_delimiter = ',')]
    pub kinds: Vec<String>,

    /// Make the operation more talkative
    #[arg(long, short, env = "VERBOSE")]
    pub verbose: bool,
}
