//! Spinnaker DCD Controller Library
//!
//! Reconciles Spinnaker applications, pipelines, pipeline templates and canary
//! configs declared as Kubernetes custom resources against Spinnaker Gate.
//!
//! ## Quick Start
//!
//! ```rust
//! use spinnaker_dcd_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

// Re-export modules so they can be tested
pub mod cli;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod exports;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod spinnaker;
