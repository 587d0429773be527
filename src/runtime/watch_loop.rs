//! # Watch Loop
//!
//! Runs one kube-runtime controller per enabled kind and handles shutdown.

use crate::constants::WATCH_RESTART_DELAY_SECS;
use crate::controller::reconciler::{
    reconcile, CancelHandle, CancelSignal, ManagedKind, Reconciler,
};
use crate::controller::server::ServerState;
use crate::runtime::error_policy::{handle_reconciliation_error, handle_watch_stream_error};
use crate::runtime::registry::KINDS;
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use kube::Client;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Resolves once `cancel` fires
///
/// The signal task in [`run_watch_loop`] is the only OS-signal listener; each
/// controller drains on this trigger instead of installing its own.
fn shutdown_trigger(cancel: &CancelSignal) -> impl Future<Output = ()> + Send + Sync + 'static {
    let mut cancel = cancel.clone();
    async move { cancel.cancelled().await }
}

/// Run the controller for kind `K` until shutdown
///
/// kube-runtime never reconciles the same object twice concurrently; different
/// objects reconcile in parallel. The controller is never restarted once
/// shutdown has been requested.
pub async fn run_controller<K: ManagedKind>(client: Client, reconciler: Arc<Reconciler>) {
    loop {
        let api: Api<K> = Api::all(client.clone());
        let watch_span = tracing::span!(tracing::Level::INFO, "controller.watch", kind = K::KIND);

        info!(parent: &watch_span, "Starting {} controller", K::KIND);
        Controller::new(api, watcher::Config::default().any_semantic())
            .graceful_shutdown_on(shutdown_trigger(&reconciler.cancel))
            .run(
                reconcile::<K>,
                handle_reconciliation_error::<K>,
                reconciler.clone(),
            )
            .for_each(|result| async move {
                match result {
                    Ok((object, _)) => debug!(kind = K::KIND, object = %object.name, "watch.event.success"),
                    Err(e) => handle_watch_stream_error(K::KIND, &format!("{e:?}")),
                }
            })
            .await;

        if reconciler.cancel.is_cancelled() {
            break;
        }
        warn!(
            "{} controller stream ended, restarting in {} seconds...",
            K::KIND,
            WATCH_RESTART_DELAY_SECS
        );
        let mut cancel = reconciler.cancel.clone();
        tokio::select! {
            () = tokio::time::sleep(Duration::from_secs(WATCH_RESTART_DELAY_SECS)) => {}
            () = cancel.cancelled() => {}
        }
        if reconciler.cancel.is_cancelled() {
            break;
        }
    }
    info!("{} controller stopped", K::KIND);
}

/// Resolves on SIGINT or SIGTERM
pub async fn shutdown_signal() {
    let interrupt = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = interrupt => {}
        () = terminate => {}
    }
}

/// Run every enabled controller until shutdown
///
/// # Errors
/// Returns an error if the configuration enables no known kind
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
    cancel: CancelHandle,
) -> Result<(), anyhow::Error> {
    let enabled: Vec<_> = KINDS
        .iter()
        .filter(|k| reconciler.config.is_kind_enabled(k.kind))
        .collect();
    if enabled.is_empty() {
        anyhow::bail!(
            "no known kind enabled (requested: {:?})",
            reconciler.config.enabled_kinds
        );
    }

    let shutdown_state = server_state.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal (SIGINT/SIGTERM), initiating graceful shutdown...");
        shutdown_state.set_ready(false);
        // Aborts task polls so in-flight reconciliations finish promptly
        cancel.cancel();
    });

    info!(
        "Starting controllers for: {}",
        enabled.iter().map(|k| k.kind).collect::<Vec<_>>().join(", ")
    );
    server_state.set_ready(true);

    futures::future::join_all(
        enabled
            .iter()
            .map(|k| (k.run)(client.clone(), reconciler.clone())),
    )
    .await;

    info!("Controller stopped gracefully");
    Ok(())
}
