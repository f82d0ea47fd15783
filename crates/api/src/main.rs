//! CareWatch Engine - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_logging(&config.server)?;

    info!("=== CareWatch Engine v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Starting care monitoring service...");

    run_server(config).await
}
