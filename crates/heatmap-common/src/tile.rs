//! XYZ tile addressing for the Web Mercator tile pyramid.

use crate::{HeatmapError, HeatmapResult};
use serde::{Deserialize, Serialize};

/// Deepest zoom level the service renders.
pub const MAX_ZOOM: u32 = 18;

/// A tile coordinate (z/x/y).
///
/// Values built through [`TileCoord::try_new`] satisfy `z <= MAX_ZOOM` and
/// `x, y < 2^z`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    /// Zoom level
    pub z: u32,
    /// Column (x)
    pub x: u32,
    /// Row (y)
    pub y: u32,
}

impl TileCoord {
    /// Build a tile address without range checks.
    pub fn new(z: u32, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Build a tile address, rejecting anything outside the pyramid.
    ///
    /// Takes signed values so negative request parameters surface as
    /// `InvalidTileCoordinate` instead of a parse failure.
    pub fn try_new(z: i64, x: i64, y: i64) -> HeatmapResult<Self> {
        if z < 0 || z > MAX_ZOOM as i64 {
            return Err(HeatmapError::InvalidTileCoordinate(format!(
                "zoom {} outside 0..={}",
                z, MAX_ZOOM
            )));
        }

        let n = Self::tiles_per_axis(z as u32) as i64;
        if x < 0 || x >= n || y < 0 || y >= n {
            return Err(HeatmapError::InvalidTileCoordinate(format!(
                "tile {}/{}/{} outside 0..{} at zoom {}",
                z, x, y, n, z
            )));
        }

        Ok(Self {
            z: z as u32,
            x: x as u32,
            y: y as u32,
        })
    }

    /// Number of tiles along one axis at a zoom level (`2^z`).
    pub fn tiles_per_axis(z: u32) -> u32 {
        1u32 << z
    }

    /// Generate a cache key fragment.
    pub fn cache_key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

impl std::fmt::Display for TileCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}
