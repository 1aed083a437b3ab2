//! Cache management handlers.

use axum::{extract::Extension, Json};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::metrics::MetricsSnapshot;
use crate::state::AppState;
use storage::CacheStatsSnapshot;

#[derive(Debug, Serialize)]
pub struct CacheClearResponse {
    pub status: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub tile_cache: CacheStatsSnapshot,
    pub service: MetricsSnapshot,
}

/// POST /tiles/cache/clear, POST /api/cache/clear - Drop every rendered tile
#[instrument(skip(state))]
pub async fn cache_clear_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<CacheClearResponse> {
    let entries = state.tile_cache.len().await;
    state.tile_cache.clear().await;
    info!(entries, "Tile cache cleared");

    Json(CacheClearResponse {
        status: "ok",
        message: "Cache cleared",
    })
}

/// GET /api/cache/stats
#[instrument(skip(state))]
pub async fn cache_stats_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<CacheStatsResponse> {
    let tile_cache = state.tile_cache.snapshot();
    state.metrics.record_tile_cache_stats(&tile_cache);

    Json(CacheStatsResponse {
        tile_cache,
        service: state.metrics.snapshot().await,
    })
}
