//! # Reconciler
//!
//! Core reconciliation logic for Spinnaker resources.
//!
//! ## Reconciliation Flow
//!
//! 1. `change`: hash the spec and compare it with the last applied hash
//! 2. `lifecycle`: pick apply, delete or no-op for the resource
//! 3. `template`: resolve `${ImportValue:...}` (pipeline templates only)
//! 4. `executor`: submit the remote operation and wait for its terminal state
//! 5. `status`: append a condition, record hash and remote identity, emit an event
//! 6. `store`: persist finalizer and status changes

pub mod change;
pub mod executor;
pub mod kinds;
pub mod lifecycle;
pub mod reconcile;
pub mod status;
pub mod store;
pub mod template;
pub mod types;

// Re-export public API
pub use executor::{CancelHandle, CancelSignal, Operation, PollSettings, TaskExecutor, TaskOutcome};
pub use kinds::ManagedKind;
pub use reconcile::reconcile;
pub use template::TemplateResolver;
pub use types::{Reconciler, ReconcilerError};
