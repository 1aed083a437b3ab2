//! Track ingestion handler.

use axum::{extract::Extension, http::StatusCode, Json};
use chrono::NaiveDate;
use heatmap_common::{HeatmapError, MercatorBounds};
use polyline::LngLat;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use super::ApiError;
use crate::state::AppState;
use storage::NewTrack;

/// Body of `POST /api/tracks`.
///
/// Exactly one of `polyline` or `coordinates` (`[lng, lat]` pairs) is
/// expected; coordinates are encoded to a polyline before storage.
#[derive(Debug, Deserialize)]
pub struct IngestTrackRequest {
    pub polyline: Option<String>,
    pub coordinates: Option<Vec<[f64; 2]>>,
    pub activity_type: Option<String>,
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct IngestTrackResponse {
    pub id: u64,
    pub bbox: Option<MercatorBounds>,
}

/// POST /api/tracks - Store a track for rendering
#[instrument(skip(state, request))]
pub async fn ingest_track_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<IngestTrackRequest>,
) -> Result<(StatusCode, Json<IngestTrackResponse>), ApiError> {
    let polyline = match (request.polyline, request.coordinates) {
        (Some(polyline), None) => polyline,
        (None, Some(coords)) => {
            let points = coords
                .iter()
                .enumerate()
                .map(|(index, &[lng, lat])| checked_point(index, lng, lat))
                .collect::<Result<Vec<_>, _>>()?;
            polyline::encode(&points)
        }
        _ => {
            return Err(HeatmapError::InvalidParameter {
                param: "polyline".to_string(),
                message: "provide exactly one of 'polyline' or 'coordinates'".to_string(),
            }
            .into())
        }
    };

    let record = state
        .tracks
        .insert(NewTrack {
            polyline,
            activity_type: request.activity_type,
            start_date: request.start_date,
        })
        .await?;
    state.metrics.record_tracks_ingested(1);

    info!(id = record.id, has_bbox = record.track.bbox.is_some(), "Track ingested");

    Ok((
        StatusCode::CREATED,
        Json(IngestTrackResponse {
            id: record.id,
            bbox: record.track.bbox,
        }),
    ))
}

/// Reject coordinates outside WGS84 ranges before they reach the encoder.
fn checked_point(index: usize, lng: f64, lat: f64) -> Result<LngLat, HeatmapError> {
    if !lng.is_finite() || !lat.is_finite() || lng.abs() > 180.0 || lat.abs() > 90.0 {
        return Err(HeatmapError::InvalidParameter {
            param: "coordinates".to_string(),
            message: format!("point {} ({}, {}) is outside [-180, 180] x [-90, 90]", index, lng, lat),
        });
    }
    Ok(LngLat::new(lng, lat))
}
