//! Daemon: wires the HTTP identity probe → reconciliation controller → UDS
//! server, and tears everything down on ctrl-c or SIGTERM.

use tokio::sync::watch;

use driftwatch_core::NotificationState;
use driftwatch_probe::HttpIdentityProbe;
use driftwatch_reconcile::{ReconciliationController, TokioScheduler};

use crate::cli::DaemonOpts;
use crate::server;

/// Run the daemon until a shutdown signal arrives.
pub async fn run_daemon(opts: DaemonOpts, socket_path: &str) -> anyhow::Result<()> {
    let probe = HttpIdentityProbe::with_timeout(opts.url.clone(), opts.probe_timeout())?;
    tracing::info!(url = %probe.url(), debounce_ms = opts.debounce_ms, "identity probe configured");

    // Bind first so a second daemon fails before probing anything.
    let listener = server::bind_socket(socket_path).await?;
    tracing::info!("UDS server listening on {socket_path}");

    let controller =
        ReconciliationController::new(probe, TokioScheduler::current(), opts.drift_config());
    let watch_handle = tokio::spawn(log_notifications(controller.subscribe()));
    controller.start();

    let server_controller = controller.clone();
    let server_handle = tokio::spawn(async move {
        if let Err(e) = server::serve(listener, server_controller).await {
            tracing::error!("UDS server error: {e}");
        }
    });

    #[cfg(unix)]
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    let shutdown = async {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        {
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
        _ = server_handle => {
            tracing::warn!("server exited unexpectedly");
        }
    }

    controller.teardown();
    watch_handle.abort();

    // Cleanup socket
    let _ = std::fs::remove_file(socket_path);
    tracing::info!("daemon stopped");
    Ok(())
}

/// Log every notification change until the controller goes away.
async fn log_notifications(mut rx: watch::Receiver<NotificationState>) {
    while rx.changed().await.is_ok() {
        let state: NotificationState = rx.borrow_and_update().clone();
        match state.new_version {
            Some(version) if state.active => {
                tracing::warn!(new_version = %version, "backend update available");
            }
            _ => tracing::info!("drift notification dismissed"),
        }
    }
}
