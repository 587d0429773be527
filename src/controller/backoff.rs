//! # Fibonacci Backoff
//!
//! Progressive retry delays for reconciliation faults. The sequence grows more
//! slowly than exponential backoff, so a resource whose Spinnaker calls keep
//! failing is retried promptly at first without hammering Gate later on.
//!
//! Sequence with `new(1, 300)`: 1s, 1s, 2s, 3s, 5s, 8s, ... capped at 300s.
//!
//! ```rust
//! use spinnaker_dcd_controller::controller::backoff::FibonacciBackoff;
//!
//! let mut backoff = FibonacciBackoff::new(1, 300);
//! assert_eq!(backoff.next_backoff_seconds(), 1);
//! assert_eq!(backoff.next_backoff_seconds(), 1);
//! assert_eq!(backoff.next_backoff_seconds(), 2);
//! assert_eq!(backoff.next_backoff_seconds(), 3);
//! ```

use std::time::Duration;

/// Fibonacci backoff calculator (seconds)
#[derive(Debug, Clone)]
pub struct FibonacciBackoff {
    /// Minimum backoff value (for reset)
    min_secs: u64,
    /// Previous backoff value
    prev_secs: u64,
    /// Current backoff value
    current_secs: u64,
    /// Maximum backoff value
    max_secs: u64,
}

impl FibonacciBackoff {
    /// Create a new Fibonacci backoff between `min_secs` and `max_secs`
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            min_secs,
            prev_secs: 0,
            current_secs: min_secs,
            max_secs,
        }
    }

    /// Get the next backoff in seconds and advance the sequence
    pub fn next_backoff_seconds(&mut self) -> u64 {
        let result = self.current_secs;
        let next = self.prev_secs.saturating_add(self.current_secs);
        self.prev_secs = self.current_secs;
        self.current_secs = next.min(self.max_secs);
        result
    }

    /// Get the next backoff as a `Duration` and advance the sequence
    #[must_use]
    pub fn next_backoff(&mut self) -> Duration {
        Duration::from_secs(self.next_backoff_seconds())
    }

    /// Reset the backoff to the initial state
    pub fn reset(&mut self) {
        self.prev_secs = 0;
        self.current_secs = self.min_secs;
    }
}

/// Backoff state for a specific resource
///
/// Tracks error count and backoff calculator for progressive retries.
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.backoff.reset();
        self.error_count = 0;
    }
}
