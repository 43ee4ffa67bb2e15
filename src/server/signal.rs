// Signal handling module
//
// Supported signals:
// - SIGTERM: shutdown
// - SIGINT:  shutdown (Ctrl+C)

use std::sync::Arc;
use tokio::sync::Notify;
use tracing::{error, info};

/// Start the signal listener (Unix)
///
/// Spawns a background task that wakes `shutdown` on the first SIGTERM or
/// SIGINT. Registration failures are logged and leave the server running.
#[cfg(unix)]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    use tokio::signal::unix::{signal, SignalKind};

    tokio::spawn(async move {
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    error!("Failed to register signal handlers: {e}");
                    return;
                }
            };

        info!(pid = std::process::id(), "Signal handlers registered (SIGTERM, SIGINT)");

        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("{name} received, shutting down");
        // notify_one stores a permit if the loop is not waiting yet
        shutdown.notify_one();
    });
}

/// Fallback for other platforms: Ctrl+C only
#[cfg(not(unix))]
pub fn start_signal_handler(shutdown: Arc<Notify>) {
    tokio::spawn(async move {
        if let Ok(()) = tokio::signal::ctrl_c().await {
            info!("Ctrl+C received, shutting down");
            shutdown.notify_one();
        }
    });
}
