use anyhow::Result;
use clap::Parser;
use tracing::info;

use mcast_bench::cli::Args;
use mcast_bench::harness::{Fabric, Harness};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = args.into_config();
    info!(
        host = %config.host,
        port = config.port,
        exchange = %config.exchange_name,
        producers = config.producer_count,
        consumers = config.consumer_count,
        "starting benchmark run"
    );

    let harness = Harness::new(config, Fabric::Ws);
    harness.run().await?;
    Ok(())
}
