//! Interrupt handling.
//!
//! A single listener task waits for SIGINT or SIGTERM, removes the socket file
//! and tells the server to stop. The server removes the file too when it exits;
//! whichever runs second finds nothing to delete.

use crate::server::remove_socket_file;
use std::io;
use std::path::PathBuf;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Spawns the interrupt listener.
///
/// Signal handlers are installed before this returns, so calling it ahead of
/// binding covers signals that arrive during startup.
pub fn spawn_interrupt_handler(
    socket_path: PathBuf,
    shutdown_tx: watch::Sender<bool>,
) -> io::Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        info!(signal = name, "Shutdown signal received.");

        if let Err(e) = remove_socket_file(&socket_path) {
            warn!(path = %socket_path.display(), error = %e, "Failed to remove socket file.");
        }

        if shutdown_tx.send(true).is_err() {
            debug!("No report server left to notify.");
        }
    }))
}
