//! XYZ heatmap tile handler.

use axum::{
    extract::{Extension, Path, Query},
    http::{header, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
};
use heatmap_common::HeatmapError;
use std::sync::Arc;
use tracing::instrument;

use super::ApiError;
use crate::rendering::{render_tile, CacheStatus, TileParams};
use crate::state::AppState;

pub const TILE_CACHE_CONTROL: &str = "public, max-age=3600";

const X_CACHE: &str = "x-cache";
const X_ACTIVITY_TOTAL: &str = "x-activity-total";
const X_ACTIVITY_RENDERED: &str = "x-activity-rendered";

/// GET /tiles/{z}/{x}/{y}.png
///
/// The `.png` suffix is optional.
#[instrument(skip(state, params))]
pub async fn tile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path((z, x, y)): Path<(String, String, String)>,
    Query(params): Query<TileParams>,
) -> Result<Response, ApiError> {
    let y = y.rsplit_once('.').map_or(y.as_str(), |(stem, _)| stem);

    let z = parse_coordinate("z", &z)?;
    let x = parse_coordinate("x", &x)?;
    let y = parse_coordinate("y", y)?;

    let tile = render_tile(&state, z, x, y, &params).await?;

    let mut response = (
        [
            (header::CONTENT_TYPE, "image/png"),
            (header::CACHE_CONTROL, TILE_CACHE_CONTROL),
        ],
        tile.bytes,
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(
        HeaderName::from_static(X_CACHE),
        HeaderValue::from_static(tile.status.as_str()),
    );
    if tile.status == CacheStatus::Miss {
        headers.insert(
            HeaderName::from_static(X_ACTIVITY_TOTAL),
            HeaderValue::from(tile.tracks_total),
        );
        headers.insert(
            HeaderName::from_static(X_ACTIVITY_RENDERED),
            HeaderValue::from(tile.tracks_rendered),
        );
    }

    Ok(response)
}

fn parse_coordinate(name: &str, raw: &str) -> Result<i64, HeatmapError> {
    raw.parse::<i64>().map_err(|_| {
        HeatmapError::InvalidTileCoordinate(format!("{} must be an integer, got '{}'", name, raw))
    })
}
