//! HTTP request handlers.
//!
//! - `tiles`: XYZ heatmap tiles
//! - `cache`: cache administration and statistics
//! - `tracks`: track ingestion
//! - `health`: liveness and Prometheus metrics

pub mod cache;
pub mod health;
pub mod tiles;
pub mod tracks;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use heatmap_common::HeatmapError;

pub use cache::{cache_clear_handler, cache_stats_handler};
pub use health::{health_handler, metrics_handler};
pub use tiles::tile_handler;
pub use tracks::ingest_track_handler;

/// Error returned from handlers: the message as plain text with the
/// status the error kind maps to.
#[derive(Debug)]
pub struct ApiError(pub HeatmapError);

impl From<HeatmapError> for ApiError {
    fn from(err: HeatmapError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            tracing::error!(code = self.0.code(), error = %self.0, "Request failed");
        }
        (status, self.0.to_string()).into_response()
    }
}
