// Server loop module
// Accepts connections until shutdown is requested

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{error, info};

use super::connection::accept_connection;
use crate::config::AppState;

/// Accept loop for the application listener
///
/// Returns once `shutdown` is notified. Connections already being served
/// are not waited for.
#[allow(clippy::ignored_unit_patterns)]
pub async fn start_server_loop(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: Arc<Notify>,
) {
    let active_connections = Arc::new(AtomicUsize::new(0));

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) => error!("Failed to accept connection: {e}"),
                }
            }

            _ = shutdown.notified() => {
                info!("Shutdown requested, no longer accepting connections");
                break;
            }
        }
    }
}
