//! # Runtime
//!
//! Process wiring: initialization, the static kind registry, the watch loops
//! and the error policy applied to failed reconciliations.

pub mod error_policy;
pub mod initialization;
pub mod registry;
pub mod watch_loop;
