use std::{net::IpAddr, path::PathBuf};

use anyhow::Result;
use beacon_ota_server::{
    ServerConfig,
    config::{DEFAULT_FIRMWARE_DIR, DEFAULT_FIRMWARE_FILE, DEFAULT_PORT},
    request_sink, start,
};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// address to listen on
    #[arg(long, env = "OTA_BIND", default_value = "0.0.0.0")]
    bind: IpAddr,

    /// port to listen on
    #[arg(short, long, env = "OTA_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// directory holding the firmware image
    #[arg(short = 'd', long, env = "OTA_FIRMWARE_DIR", default_value = DEFAULT_FIRMWARE_DIR)]
    firmware_dir: PathBuf,

    /// file name beacons request, served from the firmware directory
    #[arg(short = 'f', long, env = "OTA_FIRMWARE_FILE", default_value = DEFAULT_FIRMWARE_FILE)]
    firmware_file: String,

    /// path to a .sqlite or .jsonl file to record requests to
    #[arg(long, env = "OTA_HISTORY")]
    history: Option<PathBuf>,
}

impl From<&Args> for ServerConfig {
    fn from(args: &Args) -> Self {
        ServerConfig {
            bind: args.bind,
            port: args.port,
            firmware_dir: args.firmware_dir.clone(),
            firmware_file: args.firmware_file.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let sink = request_sink(args.history.as_deref()).await?;
    start(ServerConfig::from(&args), sink).await
}
