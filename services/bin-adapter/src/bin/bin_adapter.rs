//! Standalone binary for the BIN multicast feed adapter.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use bin_adapter::BinAdapter;
use config::load_channels;

#[derive(Parser)]
#[command(name = "bin_adapter")]
#[command(about = "BIN (EOBI-style) multicast feed adapter")]
struct Args {
    /// Path to the channels.toml configuration file.
    #[arg(short, long, default_value = "config/channels.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let channels = load_channels(&args.config)?;
    let bin_channels: Vec<_> = channels
        .into_iter()
        .filter(|c| c.protocol == config::ChannelProtocol::Bin)
        .collect();
    info!(count = bin_channels.len(), "loaded BIN channel configuration");

    let mut adapter = BinAdapter::new(bin_channels);
    adapter.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    adapter.stop().await;

    Ok(())
}
