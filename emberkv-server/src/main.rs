//! EmberKV server binary

mod api;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use emberkv_core::store::{Store, StoreConfig};

#[derive(Parser, Debug)]
#[command(name = "emberkv-server")]
#[command(about = "EmberKV key-value store server", version)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:7379", env = "EMBERKV_LISTEN")]
    listen: SocketAddr,

    /// Directory holding the append-only log and the snapshot
    #[arg(short, long, default_value = "./data", env = "EMBERKV_DATA_DIR")]
    data_dir: PathBuf,

    /// Seconds between periodic snapshot saves
    #[arg(long, default_value = "30", env = "EMBERKV_SNAPSHOT_INTERVAL_SECS")]
    snapshot_interval_secs: u64,

    /// Seconds between expiry sweeps
    #[arg(long, default_value = "1", env = "EMBERKV_SWEEP_INTERVAL_SECS")]
    sweep_interval_secs: u64,

    /// Log level when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| args.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(version = emberkv_core::VERSION, "starting EmberKV server");
    info!(data_dir = %args.data_dir.display(), "opening store");

    let config = StoreConfig::new(&args.data_dir)
        .with_snapshot_interval(Duration::from_secs(args.snapshot_interval_secs))
        .with_sweep_interval(Duration::from_secs(args.sweep_interval_secs));

    let store = Arc::new(Store::open(config).context("failed to open store")?);
    let tasks = store.start_background_tasks();

    let app = api::create_router(store);

    let listener = tokio::net::TcpListener::bind(args.listen).await?;
    info!("EmberKV server listening on {}", args.listen);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("shutting down...");
        })
        .await?;

    tasks.shutdown().await;
    info!("server stopped");
    Ok(())
}
