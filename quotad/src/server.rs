//! Unix-socket gRPC server.

use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use tokio::net::UnixListener;
use tokio_stream::wrappers::UnixListenerStream;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

use quota_proto::quota_service_server::QuotaServiceServer;

use crate::service::QuotaPluginService;

/// Binds the plugin socket and serves until `shutdown` is cancelled. The
/// socket file is removed and re-created on startup so a crashed previous
/// instance does not wedge the bind.
pub async fn serve(
    service: QuotaPluginService,
    socket_path: &str,
    shutdown: CancellationToken,
) -> Result<()> {
    let path = Path::new(socket_path);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create socket directory {}", parent.display()))?;
    }
    if path.exists() {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("Failed to remove stale socket {socket_path}"))?;
    }

    let listener = UnixListener::bind(path)
        .with_context(|| format!("Failed to bind unix socket {socket_path}"))?;
    let incoming = UnixListenerStream::new(listener);
    info!("quota plugin listening on {socket_path}");

    Server::builder()
        .add_service(QuotaServiceServer::new(service))
        .serve_with_incoming_shutdown(incoming, shutdown.cancelled())
        .await
        .context("gRPC server exited with an error")?;

    info!("quota plugin server stopped");
    let _ = tokio::fs::remove_file(path).await;
    Ok(())
}
