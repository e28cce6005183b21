//! Shared helpers: shutdown handling and retry policy.

pub mod retry;

use tokio::sync::watch;
use tracing::{error, info};

pub use retry::RetryPolicy;

/// Resolve once Ctrl+C or SIGTERM is received.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, stopping after current cycle..."),
        _ = terminate => info!("Received SIGTERM, stopping after current cycle..."),
    }
}

/// Spawn a signal listener and return a receiver that flips to `true` on shutdown.
///
/// Poll loops check the flag between cycles and race it against their sleep,
/// so a cycle that is already running always completes.
pub fn shutdown_channel() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });
    rx
}

/// Sleep for `duration` unless shutdown is requested first.
///
/// Returns `true` if the loop should stop.
pub async fn sleep_or_shutdown(duration: std::time::Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    if *shutdown.borrow() {
        return true;
    }
    tokio::select! {
        _ = tokio::time::sleep(duration) => false,
        Ok(()) = shutdown.changed() => *shutdown.borrow(),
    }
}
