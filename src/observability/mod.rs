//! # Observability
//!
//! Prometheus metrics for the controller. Tracing is configured at startup in
//! `runtime::initialization`.

pub mod metrics;
