//! Standalone binary for the TXT ASCII feed adapter.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use config::load_channels;
use txt_adapter::TxtAdapter;

#[derive(Parser)]
#[command(name = "txt_adapter")]
#[command(about = "TXT (Montreal MX HSVF-style) ASCII feed adapter")]
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
    let txt_channels: Vec<_> = channels
        .into_iter()
        .filter(|c| c.protocol == config::ChannelProtocol::Txt)
        .collect();
    info!(count = txt_channels.len(), "loaded TXT channel configuration");

    let mut adapter = TxtAdapter::new(txt_channels);
    adapter.start().await?;

    tokio::signal::ctrl_c().await?;
    info!("shutdown signal received");
    adapter.stop().await;

    Ok(())
}
