//! Application state and shared resources.

use anyhow::Result;
use bytes::Bytes;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

use crate::config::Args;
use crate::metrics::MetricsCollector;
use storage::{InMemoryTrackStore, TileMemoryCache, TrackSource};

/// Shared application state.
pub struct AppState {
    /// Rendered tile bytes keyed by the full request key
    pub tile_cache: Arc<TileMemoryCache>,
    /// Store that `POST /api/tracks` writes into
    pub tracks: Arc<InMemoryTrackStore>,
    /// Where tile renders look for candidate tracks
    pub track_source: Arc<dyn TrackSource>,
    pub metrics: Arc<MetricsCollector>,
    pub tile_size: usize,
    /// Encoded once, served for every empty tile
    pub transparent_tile: Bytes,
    pub prometheus: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(tile_size: usize, tile_cache_mb: usize) -> Result<Self> {
        let tracks = Arc::new(InMemoryTrackStore::new());
        let transparent_tile = Bytes::from(renderer::png::transparent_tile_png(tile_size)?);

        Ok(Self {
            tile_cache: Arc::new(TileMemoryCache::new(tile_cache_mb)),
            track_source: tracks.clone(),
            tracks,
            metrics: Arc::new(MetricsCollector::new()),
            tile_size,
            transparent_tile,
            prometheus: None,
        })
    }

    pub fn from_args(args: &Args) -> Result<Self> {
        Self::new(args.tile_size, args.tile_cache_mb)
    }

    /// Render from a different track source than the ingestion store.
    pub fn with_track_source(mut self, source: Arc<dyn TrackSource>) -> Self {
        self.track_source = source;
        self
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}
