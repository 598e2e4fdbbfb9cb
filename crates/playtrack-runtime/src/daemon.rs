//! Daemon wiring: store + API client + coordinator + periodic flush +
//! UDS server, shut down together on ctrl-c or SIGTERM.

use std::path::Path;
use std::sync::Arc;

use tokio::time::{Duration, interval};

use playtrack_api::{ApiClient, ReqwestTransport};
use playtrack_session::{Coordinator, CoordinatorHandle};
use playtrack_store::{JsonFileStore, MappingRepository, SettingsStore};

use crate::cli::DaemonOpts;
use crate::server;

/// Run the daemon: starts the coordinator, flush ticker, and UDS server,
/// then waits for a shutdown signal.
pub async fn run_daemon(opts: DaemonOpts, socket_path: &str, store_path: &Path) -> anyhow::Result<()> {
    let backend = Arc::new(JsonFileStore::new(store_path));
    let mappings = MappingRepository::new(Arc::clone(&backend));
    let settings = SettingsStore::new(backend);
    let api = ApiClient::new(ReqwestTransport::new());

    let (handle, coordinator_task) = Coordinator::spawn(mappings, settings, api);
    tracing::info!("state stored at {}", store_path.display());

    // Start UDS server
    let server_handle_clone = handle.clone();
    let server_socket = socket_path.to_string();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::run_server(&server_socket, server_handle_clone).await {
            tracing::error!("UDS server error: {e}");
        }
    });

    // Start the safety-net flush ticker
    let tick_handle = tokio::spawn(run_flush_ticker(handle, opts.flush_interval_secs));

    // Wait for shutdown signal (ctrl-c or SIGTERM)
    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
            let mut sigterm =
                tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                    .expect("failed to register SIGTERM handler");
            tokio::select! {
                _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM, shutting down"),
            }
        }

        #[cfg(not(unix))]
        {
            ctrl_c.await.ok();
            tracing::info!("received ctrl-c, shutting down");
        }
    };

    tokio::select! {
        () = shutdown => {}
        _ = coordinator_task => {
            tracing::warn!("coordinator exited unexpectedly");
        }
        _ = tick_handle => {
            tracing::warn!("flush ticker exited unexpectedly");
        }
        _ = server_handle => {
            tracing::warn!("server exited unexpectedly");
        }
    }

    // Cleanup socket
    let _ = std::fs::remove_file(socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

/// Periodic safety-net flush so a long-lived session is reported even if
/// focus never changes.
async fn run_flush_ticker(handle: CoordinatorHandle, interval_secs: u64) {
    let mut ticker = interval(Duration::from_secs(interval_secs));
    // First tick fires immediately; a flush on an empty session is a no-op
    // either way.
    loop {
        ticker.tick().await;
        if handle.periodic_flush().await.is_err() {
            tracing::debug!("coordinator gone, stopping flush ticker");
            break;
        }
    }
}
