//! # Configuration
//!
//! Controller configuration resolved once at startup.

mod controller;

pub use controller::ControllerConfig;
