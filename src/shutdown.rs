use std::sync::Arc;

use tokio::signal;

use crate::server::AppState;

/// Wait for a shutdown signal (SIGINT or SIGTERM).
pub async fn wait_for_shutdown() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown...");
        }
    }
}

/// Wait for in-flight reconciliations to finish, up to the configured grace period.
///
/// Workflows still running afterwards are abandoned mid-flight; their pull
/// requests may need a fresh event to be reconciled.
pub async fn graceful_shutdown(state: &Arc<AppState>) {
    let count = state.in_flight.len();
    if count == 0 {
        tracing::info!("No in-flight reconciliations");
        return;
    }

    let grace = state.config.reconcile.shutdown_grace();
    tracing::info!(count, grace = ?grace, "Waiting for in-flight reconciliations");

    let remaining = state.in_flight.wait_idle(grace).await;
    for pr in &remaining {
        tracing::warn!(pr = %pr, "Reconciliation still running at shutdown, abandoning");
    }

    tracing::info!(abandoned = remaining.len(), "Graceful shutdown complete");
}
