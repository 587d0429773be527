//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use spinnaker_dcd_controller::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Remote collaborators
pub use crate::exports::{Export, ExportPage, ExportRegistry, RegistryError};
pub use crate::spinnaker::{ExecutionResponse, GateApi, GateError, Task, TaskRef};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::lifecycle::{Applied, LifecycleState, RemoteHandler, Transition};
pub use crate::controller::reconciler::store::{ResourceEvent, ResourceStore, StoreError};
pub use crate::controller::reconciler::{
    reconcile, CancelHandle, CancelSignal, ManagedKind, Operation, Reconciler, ReconcilerError,
    TaskExecutor, TaskOutcome,
};

// Config types - for configuration management
pub use crate::config::ControllerConfig;
