use tokio::sync::watch;
use tracing::{error, info};

/// Watch channel that flips to `true` on CTRL+C or SIGTERM
///
/// The job store listens on the receiver and cancels whatever remote call
/// is in flight, which also releases its busy flag. Must be called from
/// inside the tokio runtime.
pub fn listen() -> watch::Receiver<bool> {
    // watch channel allows multiple receivers to get the same value
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        wait_for_signal().await;
        if let Err(e) = shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {:?}", e);
        }
    });

    shutdown_rx
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install CTRL+C signal handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received CTRL+C signal, cancelling pending requests...");
        }
        _ = terminate => {
            info!("Received SIGTERM signal, cancelling pending requests...");
        }
    }
}
