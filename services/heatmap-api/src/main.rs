//! Activity heatmap tile server.
//!
//! Serves XYZ tiles colored by how many stored GPS tracks cross each pixel.

use anyhow::{Context, Result};
use clap::Parser;
use std::{net::SocketAddr, sync::Arc};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

use heatmap_api::config::Args;
use heatmap_api::state::AppState;

fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(threads) = args.worker_threads {
        runtime_builder.worker_threads(threads);
    }

    let runtime = runtime_builder.build()?;
    runtime.block_on(async_main(args))
}

async fn async_main(args: Args) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.tracing_level())
        .json()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let prometheus_handle = metrics_exporter_prometheus::PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    info!(
        tile_size = args.tile_size,
        tile_cache_mb = args.tile_cache_mb,
        worker_threads = ?args.worker_threads,
        "Starting heatmap tile server"
    );

    let state = AppState::from_args(&args)?.with_prometheus(prometheus_handle);

    if let Some(path) = &args.tracks_file {
        let loaded = state
            .tracks
            .load_json_file(path)
            .await
            .with_context(|| format!("failed to load tracks from {}", path.display()))?;
        state.metrics.record_tracks_ingested(loaded as u64);
    }

    let app = heatmap_api::build_router(Arc::new(state));

    let addr: SocketAddr = args.listen.parse()?;
    info!(address = %addr, "Listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
