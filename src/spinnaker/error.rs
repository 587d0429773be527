//! Gate client errors

use thiserror::Error;

/// Failure to talk to Spinnaker Gate
///
/// Every variant is a transport-level fault: the request did not produce a
/// usable answer and the whole reconciliation step may be retried.
#[derive(Debug, Error)]
pub enum GateError {
    #[error("request to Spinnaker Gate failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Spinnaker Gate returned {status} for {operation}: {body}")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("unexpected response from Spinnaker Gate for {operation}: {reason}")]
    InvalidResponse {
        operation: &'static str,
        reason: String,
    },
}
