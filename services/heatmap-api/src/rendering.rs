//! Tile render orchestration: validation, cache, track lookup, rasterization.

use bytes::Bytes;
use heatmap_common::{HeatmapError, HeatmapResult, TileCoord, TrackFilters};
use renderer::gradient::DEFAULT_MIDPOINT;
use renderer::{GradientChoice, TileRasterizer};
use serde::Deserialize;
use storage::{CustomGradientKey, TileCacheKey, Track};
use tracing::{debug, instrument, warn};

use crate::metrics::Timer;
use crate::state::AppState;

/// Fraction of the tile size added on every side when asking for candidate
/// tracks.
pub const TRACK_QUERY_EXPANSION: f64 = 0.1;

/// How a tile response was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
    /// Nothing drawn; the shared transparent tile, never cached
    Empty,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
            CacheStatus::Empty => "EMPTY",
        }
    }
}

/// Query parameters of a tile request.
///
/// Everything arrives as text so that parse failures become
/// `InvalidParameter` instead of a generic extractor rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TileParams {
    pub gradient: Option<String>,
    pub activity_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub min_color: Option<String>,
    pub mid_color: Option<String>,
    pub max_color: Option<String>,
    pub midpoint: Option<String>,
}

impl TileParams {
    fn midpoint(&self) -> HeatmapResult<Option<i64>> {
        match self.midpoint.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| HeatmapError::InvalidParameter {
                    param: "midpoint".to_string(),
                    message: format!("'{}' is not an integer", raw),
                }),
        }
    }
}

/// A finished tile.
#[derive(Debug, Clone)]
pub struct TileResponse {
    pub bytes: Bytes,
    pub status: CacheStatus,
    /// Candidate tracks returned by the track source (misses only)
    pub tracks_total: usize,
    /// Candidates that drew at least one segment (misses only)
    pub tracks_rendered: usize,
}

impl TileResponse {
    fn hit(bytes: Bytes) -> Self {
        Self {
            bytes,
            status: CacheStatus::Hit,
            tracks_total: 0,
            tracks_rendered: 0,
        }
    }

    fn empty(state: &AppState, tracks_total: usize) -> Self {
        Self {
            bytes: state.transparent_tile.clone(),
            status: CacheStatus::Empty,
            tracks_total,
            tracks_rendered: 0,
        }
    }
}

/// A request that passed validation.
struct ResolvedRequest {
    tile: TileCoord,
    filters: TrackFilters,
    gradient: GradientChoice,
    cache_key: String,
}

/// Parse and validate every request input.
///
/// Runs before the cache or the track source is touched, so a bad request
/// never costs a lookup.
fn resolve_request(z: i64, x: i64, y: i64, params: &TileParams) -> HeatmapResult<ResolvedRequest> {
    let tile = TileCoord::try_new(z, x, y)?;
    let filters = TrackFilters::parse(
        params.activity_type.as_deref(),
        params.start_date.as_deref(),
        params.end_date.as_deref(),
    )?;
    let midpoint = params.midpoint()?;
    let gradient = GradientChoice::resolve(
        params.gradient.as_deref(),
        params.min_color.as_deref(),
        params.mid_color.as_deref(),
        params.max_color.as_deref(),
        midpoint,
    )?;

    let gradient_name = match &gradient {
        GradientChoice::Preset(preset) => preset.name(),
        GradientChoice::Custom(_) => "custom",
    };
    let custom = match (&gradient, &params.min_color, &params.mid_color, &params.max_color) {
        (GradientChoice::Custom(_), Some(min), Some(mid), Some(max)) => Some(CustomGradientKey {
            min_color: min.clone(),
            mid_color: mid.clone(),
            max_color: max.clone(),
            midpoint: midpoint.unwrap_or(DEFAULT_MIDPOINT),
        }),
        _ => None,
    };

    let cache_key = TileCacheKey::new(tile, gradient_name, filters.clone(), custom).to_string();

    Ok(ResolvedRequest {
        tile,
        filters,
        gradient,
        cache_key,
    })
}

/// Render (or fetch from cache) one heatmap tile.
#[instrument(skip(state, params))]
pub async fn render_tile(
    state: &AppState,
    z: i64,
    x: i64,
    y: i64,
    params: &TileParams,
) -> HeatmapResult<TileResponse> {
    state.metrics.record_tile_request();

    let request = match resolve_request(z, x, y, params) {
        Ok(request) => request,
        Err(e) => {
            state.metrics.record_invalid_request(e.code());
            return Err(e);
        }
    };

    if let Some(bytes) = state.tile_cache.get(&request.cache_key).await {
        state.metrics.record_cache_hit();
        debug!(key = %request.cache_key, "Tile cache hit");
        return Ok(TileResponse::hit(bytes));
    }
    state.metrics.record_cache_miss();

    let query_bounds = projection::tile_bounds(&request.tile).expand(TRACK_QUERY_EXPANSION);
    let query_timer = Timer::start();
    let tracks = state
        .track_source
        .find_tracks(&query_bounds, &request.filters)
        .await?;
    state.metrics.record_track_query(query_timer.elapsed_us()).await;

    let tracks_total = tracks.len();
    if tracks.is_empty() {
        state.metrics.record_empty_tile();
        debug!("No candidate tracks");
        return Ok(TileResponse::empty(state, 0));
    }

    let render_timer = Timer::start();
    let tile = request.tile;
    let size = state.tile_size;
    let gradient = request.gradient;
    let result = tokio::task::spawn_blocking(move || rasterize(tile, size, &tracks, gradient))
        .await
        .map_err(|e| HeatmapError::RenderError(format!("render task failed: {}", e)))
        .and_then(|inner| inner);

    let outcome = match result {
        Ok(outcome) => {
            state.metrics.record_render(render_timer.elapsed_us(), true).await;
            outcome
        }
        Err(e) => {
            state.metrics.record_render(render_timer.elapsed_us(), false).await;
            return Err(e);
        }
    };

    state
        .metrics
        .record_tracks(tracks_total, outcome.rendered, outcome.undecodable);

    let Some(png) = outcome.png else {
        state.metrics.record_empty_tile();
        debug!(tracks_total, "Candidate tracks drew nothing");
        return Ok(TileResponse::empty(state, tracks_total));
    };

    state.metrics.record_png_encode(outcome.encode_us).await;

    let bytes = Bytes::from(png);
    state.tile_cache.put(request.cache_key, bytes.clone()).await;
    state
        .metrics
        .record_tile_cache_stats(&state.tile_cache.snapshot());

    debug!(
        tracks_total,
        tracks_rendered = outcome.rendered,
        bytes = bytes.len(),
        "Tile rendered"
    );

    Ok(TileResponse {
        bytes,
        status: CacheStatus::Miss,
        tracks_total,
        tracks_rendered: outcome.rendered,
    })
}

/// Result of the blocking half of a render.
struct RasterOutcome {
    /// `None` when no track drew a segment
    png: Option<Vec<u8>>,
    rendered: usize,
    undecodable: usize,
    encode_us: u64,
}

fn rasterize(
    tile: TileCoord,
    size: usize,
    tracks: &[Track],
    gradient: GradientChoice,
) -> HeatmapResult<RasterOutcome> {
    let mut rasterizer = TileRasterizer::new(tile, size);
    let mut rendered = 0;
    let mut undecodable = 0;

    for track in tracks {
        let points = match polyline::decode(&track.polyline) {
            Ok(points) => points,
            Err(e) => {
                undecodable += 1;
                warn!(error = %e, "Skipping undecodable track");
                continue;
            }
        };
        if rasterizer.add_polyline(&points) > 0 {
            rendered += 1;
        }
    }

    if rendered == 0 {
        return Ok(RasterOutcome {
            png: None,
            rendered,
            undecodable,
            encode_us: 0,
        });
    }

    let timer = Timer::start();
    let png = rasterizer.encode_png(gradient.gradient())?;

    Ok(RasterOutcome {
        png: Some(png),
        rendered,
        undecodable,
        encode_us: timer.elapsed_us(),
    })
}
