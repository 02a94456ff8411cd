use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;
use tokio_util::sync::CancellationToken;

use quotad::cli::{Cli, Commands};
use quotad::config::load_config;
use quotad::server;
use quotad::service::QuotaPluginService;
use quotad::storage::{BackendConfig, BackendRegistry};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Start { config } => {
            let path = config.to_string_lossy();
            let cfg = load_config(&path)?;

            let shutdown = CancellationToken::new();
            let ctrl_c_shutdown = shutdown.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("shutdown signal received");
                    ctrl_c_shutdown.cancel();
                }
            });

            let registry = BackendRegistry::with_defaults();
            let backend = registry
                .new_backend(
                    &cfg.storage_name,
                    BackendConfig::from_config(&cfg, shutdown.clone()),
                )
                .await
                .with_context(|| format!("Failed to connect backend {}", cfg.storage_name))?;
            info!("storage backend {} connected", cfg.storage_name);

            let service = QuotaPluginService::new(Arc::clone(&backend))
                .await
                .context("Backend capability descriptor is unusable")?;

            server::serve(service, &cfg.socket_path, shutdown).await?;
        }
    }

    Ok(())
}
