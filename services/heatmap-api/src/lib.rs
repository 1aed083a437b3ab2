//! Activity heatmap tile service library.
//!
//! Exposes the router and its parts so integration tests can drive the
//! service without binding a socket.

pub mod config;
pub mod handlers;
pub mod metrics;
pub mod rendering;
pub mod state;

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use state::AppState;

/// Build the HTTP router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Heatmap tiles; `y` may carry a `.png` suffix
        .route("/tiles/:z/:x/:y", get(handlers::tile_handler))
        // Cache administration
        .route("/tiles/cache/clear", post(handlers::cache_clear_handler))
        .route("/api/cache/clear", post(handlers::cache_clear_handler))
        .route("/api/cache/stats", get(handlers::cache_stats_handler))
        // Track ingestion
        .route("/api/tracks", post(handlers::ingest_track_handler))
        // Health check
        .route("/health", get(handlers::health_handler))
        // Metrics
        .route("/metrics", get(handlers::metrics_handler))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}
