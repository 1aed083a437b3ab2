//! Health check and Prometheus metrics handlers.

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tracing::instrument;

use crate::state::AppState;

/// GET /health - Liveness check
pub async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /metrics - Prometheus metrics endpoint
///
/// Without an installed recorder only the collector's own counters are
/// listed.
#[instrument(skip(state))]
pub async fn metrics_handler(Extension(state): Extension<Arc<AppState>>) -> impl IntoResponse {
    state
        .metrics
        .record_tile_cache_stats(&state.tile_cache.snapshot());

    let body = match &state.prometheus {
        Some(handle) => handle.render(),
        None => {
            let m = &state.metrics;
            let mut output = String::new();
            for (name, help, value) in [
                ("heatmap_tile_requests_total", "Tile requests", &m.tile_requests),
                ("heatmap_tile_cache_hits_total", "Tile cache hits", &m.cache_hits),
                ("heatmap_tile_cache_misses_total", "Tile cache misses", &m.cache_misses),
                ("heatmap_empty_tiles_total", "Transparent tiles served", &m.empty_tiles),
                ("heatmap_renders_total", "Tile renders", &m.renders_total),
                ("heatmap_tracks_ingested_total", "Tracks ingested", &m.tracks_ingested),
            ] {
                output.push_str(&format!(
                    "# HELP {name} {help}\n# TYPE {name} counter\n{name} {}\n",
                    value.load(Ordering::Relaxed)
                ));
            }
            output
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}
