//! HTTP front end.
//!
//! Serves the `/rpc` query endpoint used by the spectrum page and every other
//! path as a static file. Handlers only read the [`SnapshotStore`](crate::data::SnapshotStore);
//! they never touch the device.

pub mod handlers;
pub mod router;

use std::net::SocketAddr;

use tokio::net::{lookup_host, TcpListener};
use tracing::info;

use crate::config::ServerConfig;
use crate::data::SnapshotStore;

pub use router::build_router;

/// Bind the configured address and serve until the process ends.
///
/// # Errors
///
/// Returns an error if the address does not resolve, the listener cannot
/// bind, or the server hits a fatal I/O error.
pub async fn serve(config: &ServerConfig, store: SnapshotStore) -> Result<(), ServerError> {
    let addr: SocketAddr = lookup_host(config.addr.as_str())
        .await
        .map_err(|e| ServerError::Bind(format!("cannot resolve {}: {e}", config.addr)))?
        .next()
        .ok_or_else(|| ServerError::Bind(format!("no address for {}", config.addr)))?;

    let router = build_router(store, &config.static_dir);

    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;

    info!(%addr, static_dir = %config.static_dir.display(), "HTTP server listening");

    axum::serve(listener, router)
        .await
        .map_err(|e| ServerError::Serve(format!("serve error: {e}")))?;

    Ok(())
}

/// Errors that can occur when starting or running the HTTP server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Failed to resolve or bind the listen address.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}
