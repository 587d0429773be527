//! # Initialization
//!
//! Controller initialization logic including rustls setup, tracing, metrics,
//! server startup, and client setup for Kubernetes, Spinnaker Gate and
//! CloudFormation.

use crate::config::ControllerConfig;
use crate::controller::reconciler::{CancelHandle, CancelSignal, Reconciler};
use crate::controller::server::{start_server, ServerState};
use crate::exports::CloudFormationExports;
use crate::observability;
use crate::spinnaker::GateClient;
use anyhow::{Context, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Components the watch loop needs
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    /// Fires the reconciler's cancellation signal on shutdown
    pub cancel: CancelHandle,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Default log filter for the given verbosity
#[must_use]
pub fn default_log_filter(verbose: bool) -> &'static str {
    if verbose {
        "spinnaker_dcd_controller=debug"
    } else {
        "spinnaker_dcd_controller=info"
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - rustls crypto provider setup
/// - Tracing subscriber setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes, Gate and CloudFormation client creation
/// - Reconciler setup
///
/// # Errors
/// Returns an error if metrics registration or client creation fails
pub async fn initialize(config: ControllerConfig) -> Result<InitializationResult> {
    // Configure rustls crypto provider FIRST, before any client is built
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_log_filter(config.verbose).into()),
        )
        .init();

    info!("Starting Spinnaker DCD Controller");
    info!(
        "Build info: datetime={}, git_hash={}",
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    debug!(?config, "controller configuration");

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::default());
    let server_state_clone = server_state.clone();
    let server_port = config.metrics_port;
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let gate = GateClient::new(&config.spinnaker_endpoint)
        .context("Failed to create Spinnaker Gate client")?;
    info!("Using Spinnaker Gate at {}", config.spinnaker_endpoint);

    let registry = CloudFormationExports::from_env().await;

    let (cancel, cancel_signal) = CancelSignal::channel();
    let reconciler = Arc::new(Reconciler::new(
        client.clone(),
        Arc::new(gate),
        Arc::new(registry),
        config,
        cancel_signal,
    ));

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
        cancel,
    })
}
