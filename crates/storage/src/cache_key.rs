//! Cache keys for rendered heatmap tiles.

use heatmap_common::{TileCoord, TrackFilters};
use serde::{Deserialize, Serialize};

/// Custom gradient parameters as they appeared on the request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CustomGradientKey {
    pub min_color: String,
    pub mid_color: String,
    pub max_color: String,
    pub midpoint: i64,
}

/// Everything that can change the bytes of a rendered tile.
///
/// Two requests share a cache entry only if every field matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCacheKey {
    pub tile: TileCoord,
    pub gradient: String,
    pub filters: TrackFilters,
    pub custom: Option<CustomGradientKey>,
}

impl TileCacheKey {
    pub fn new(
        tile: TileCoord,
        gradient: impl Into<String>,
        filters: TrackFilters,
        custom: Option<CustomGradientKey>,
    ) -> Self {
        Self {
            tile,
            gradient: gradient.into(),
            filters,
            custom,
        }
    }
}

impl std::fmt::Display for TileCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "heatmap:{}:{}:{}",
            self.tile.cache_key(),
            self.gradient,
            self.filters.cache_key()
        )?;
        match &self.custom {
            Some(c) => write!(
                f,
                ":{},{},{},{}",
                c.min_color, c.mid_color, c.max_color, c.midpoint
            ),
            None => write!(f, ":-"),
        }
    }
}
