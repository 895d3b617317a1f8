use clap::Parser;
use log::info;
use server::config::ServerConfig;
use server::network::FarmServer;
use shared::{DEFAULT_PORT, DEFAULT_RIPEN_WORKERS};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Server IP address to bind to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port to listen on
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Seconds from planting until a crop is ripe
    #[arg(short, long, default_value = "10")]
    growth_secs: u64,

    /// Maximum number of growth timers firing at once
    #[arg(short, long, default_value_t = DEFAULT_RIPEN_WORKERS)]
    workers: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        ServerConfig {
            host: args.host,
            port: args.port,
            growth_delay: Duration::from_secs(args.growth_secs),
            ripen_workers: args.workers,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    if std::env::var("RUST_LOG").is_err() {
        eprintln!("Set RUST_LOG=info for detailed logging");
    }

    let config = ServerConfig::from(Args::parse());
    let server = FarmServer::bind(&config).await?;

    tokio::select! {
        _ = server.run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
