//! # Spinnaker DCD Controller
//!
//! A Kubernetes controller that keeps Spinnaker in sync with custom resources.
//!
//! ## Overview
//!
//! | Kind | Spinnaker object |
//! |---|---|
//! | `Application` | Application (create, update, delete tasks) |
//! | `PipelineTemplate` | Managed pipeline template, `${ImportValue:...}` resolved from CloudFormation exports |
//! | `Pipeline` | Pipeline config (saved once) |
//! | `CanaryConfig` | Kayenta canary config |
//!
//! Each resource carries a finalizer once it exists in Spinnaker; deleting the
//! resource deletes the Spinnaker object first.

use anyhow::Result;
use clap::Parser;
use spinnaker_dcd_controller::cli::Cli;
use spinnaker_dcd_controller::config::ControllerConfig;
use spinnaker_dcd_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ControllerConfig::from(Cli::parse());

    let init = initialize(config).await?;

    run_watch_loop(init.client, init.reconciler, init.server_state, init.cancel).await
}
