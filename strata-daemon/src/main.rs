//! Strata Daemon (`stratad`)
//!
//! Headless daemon that runs the Strata DID node: the batching pipeline,
//! the ledger observer, and the in-memory projection.

use clap::Parser;
use std::path::PathBuf;
use strata_daemon::{NodeConfig, StrataNode};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "stratad", version, about = "Strata Headless DID Node Daemon")]
struct Args {
    /// Path to a JSON config file (defaults apply when omitted)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    tracing::info!("stratad v{} starting...", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };

    let node = StrataNode::start(&config).map_err(|e| {
        tracing::error!("Failed to start: {}", e);
        anyhow::anyhow!("{}", e)
    })?;

    tracing::info!(
        method = %config.did_method_name,
        batch_interval_seconds = config.batch_interval_seconds,
        "Node ready. Press Ctrl+C to stop."
    );

    // Wait for shutdown signal
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("Shutdown signal received...");

    node.shutdown().await;

    tracing::info!("Daemon stopped");
    Ok(())
}

fn init_tracing(verbosity: u8) {
    let mut filter = EnvFilter::from_default_env();

    // Only apply defaults if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        let level = match verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        };
        filter = filter.add_directive(level.parse().expect("static level directive"));
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
