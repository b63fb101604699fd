//! # Report Server
//!
//! This module defines the `ReportServer`, which owns the plugin's Unix domain
//! socket for its whole life: it clears any stale socket file, binds the
//! listener, serves the report router over it with `axum`, and removes the
//! socket file again however serving ends.
//!
//! Shutdown is not a graceful drain. When the shutdown signal fires the serve
//! future is dropped, the listener closes and in-flight connections are left to
//! the runtime.

use anyhow::{Context, Result};
use axum::Router;
use std::future::IntoFuture;
use std::io;
use std::path::{Path, PathBuf};
use tokio::net::UnixListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Removes the socket file at `path`.
///
/// A file that is already gone counts as success, so any number of callers
/// may race to clean up the same path.
pub fn remove_socket_file(path: &Path) -> io::Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!(path = %path.display(), "Removed socket file.");
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

/// Owns a socket path and removes it when dropped.
#[derive(Debug)]
pub struct SocketFile {
    path: PathBuf,
}

impl SocketFile {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SocketFile {
    fn drop(&mut self) {
        if let Err(e) = remove_socket_file(&self.path) {
            warn!(path = %self.path.display(), error = %e, "Failed to remove socket file.");
        }
    }
}

/// A bound, not yet serving, report server.
#[derive(Debug)]
pub struct ReportServer {
    listener: UnixListener,
    socket: SocketFile,
}

impl ReportServer {
    /// Binds a listening socket at `path`, replacing any stale file there.
    ///
    /// Must be called from within a tokio runtime.
    pub fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        remove_socket_file(path)
            .with_context(|| format!("Failed to remove stale socket at {}", path.display()))?;

        let listener = UnixListener::bind(path)
            .with_context(|| format!("Failed to bind unix socket at {}", path.display()))?;

        Ok(Self {
            listener,
            socket: SocketFile {
                path: path.to_path_buf(),
            },
        })
    }

    pub fn path(&self) -> &Path {
        self.socket.path()
    }

    /// Serves `router` until the serve loop ends or `shutdown_rx` fires.
    ///
    /// The socket file is removed before this returns on either path.
    pub async fn run(self, router: Router, mut shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        let Self { listener, socket } = self;
        info!("Listening on: unix://{}", socket.path().display());

        let result = tokio::select! {
            biased;
            _ = shutdown_rx.changed() => {
                info!("Report server received shutdown signal.");
                Ok(())
            }
            result = axum::serve(listener, router.into_make_service()).into_future() => {
                if let Err(e) = &result {
                    error!(error = %e, "Report server error.");
                }
                result.context("Report server stopped unexpectedly")
            }
        };

        drop(socket);
        debug!("Report server task finished.");
        result
    }
}
