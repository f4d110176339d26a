//! Switchboard — room-scoped WebSocket signaling relay for peer-to-peer
//! audio sessions.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use switchboard_server::{RelayConfig, RelayServer};

#[derive(Debug, Parser)]
#[command(name = "switchboard", version, about = "Room-scoped signaling relay")]
struct Cli {
    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Override the bind host.
    #[arg(long)]
    host: Option<String>,
    /// Override the bind port.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let mut config = RelayConfig::load(cli.config.as_deref()).context("loading configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("installing metrics recorder")?;

    let server = RelayServer::new(config, metrics);
    let (addr, handle) = server.listen().await.context("binding listener")?;
    info!(%addr, "switchboard relay ready");

    tokio::signal::ctrl_c()
        .await
        .context("listening for ctrl+c")?;
    info!("shutdown signal received");
    server.shutdown().graceful_shutdown(vec![handle], None).await;

    Ok(())
}
