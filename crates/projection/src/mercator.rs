//! Spherical Web Mercator (EPSG:3857).
//!
//! The tile-to-meters mapping here is shared by the rasterizer, the track
//! bounding boxes and the storage pre-filter. All of them must use these
//! constants and this order of operations, otherwise tiles rendered
//! independently disagree on their shared edges and show 1-pixel seams.

use std::f64::consts::PI;

use heatmap_common::{MercatorBounds, TileCoord, MAX_ZOOM};

/// WGS84 semi-major axis used as the sphere radius (meters).
pub const EARTH_RADIUS: f64 = 6378137.0;

/// Half the projected world width: `π·R` (meters).
pub const ORIGIN_SHIFT: f64 = PI * EARTH_RADIUS;

/// Project WGS84 longitude/latitude (degrees) to Web Mercator meters.
///
/// Returns `None` at or beyond the poles (`lat <= -90` or `lat >= 90`),
/// where `ln(tan(..))` diverges. Callers drop such points; it is not an
/// error.
pub fn lnglat_to_mercator(lng: f64, lat: f64) -> Option<(f64, f64)> {
    if lat <= -90.0 || lat >= 90.0 {
        return None;
    }

    let x = lng * PI / 180.0 * EARTH_RADIUS;
    let y = ((PI * 0.25) + (0.5 * lat * PI / 180.0)).tan().ln() * EARTH_RADIUS;

    Some((x, y))
}

/// Inverse projection: Web Mercator meters to `(lng, lat)` degrees.
pub fn mercator_to_lnglat(x: f64, y: f64) -> (f64, f64) {
    let lng = x / EARTH_RADIUS * 180.0 / PI;
    let lat = (2.0 * (y / EARTH_RADIUS).exp().atan() - PI / 2.0) * 180.0 / PI;
    (lng, lat)
}

/// Web Mercator bounds of a tile.
pub fn tile_bounds(tile: &TileCoord) -> MercatorBounds {
    let num_tiles = TileCoord::tiles_per_axis(tile.z) as f64;
    let tile_size = (2.0 * ORIGIN_SHIFT) / num_tiles;

    let min_x = tile.x as f64 * tile_size - ORIGIN_SHIFT;
    let max_y = ORIGIN_SHIFT - tile.y as f64 * tile_size;
    let max_x = min_x + tile_size;
    let min_y = max_y - tile_size;

    MercatorBounds::new(min_x, min_y, max_x, max_y)
}

/// Find the tile containing a WGS84 position at a zoom level.
///
/// Points on the far east/south edge of the world are assigned to the last
/// column/row.
pub fn lnglat_to_tile(lng: f64, lat: f64, z: u32) -> Option<TileCoord> {
    if z > MAX_ZOOM {
        return None;
    }
    let (mx, my) = lnglat_to_mercator(lng, lat)?;

    let n = TileCoord::tiles_per_axis(z);
    let tile_size = (2.0 * ORIGIN_SHIFT) / n as f64;
    let last = (n - 1) as f64;

    let x = ((mx + ORIGIN_SHIFT) / tile_size).floor().clamp(0.0, last);
    let y = ((ORIGIN_SHIFT - my) / tile_size).floor().clamp(0.0, last);

    Some(TileCoord::new(z, x as u32, y as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let (x, y) = lnglat_to_mercator(0.0, 0.0).unwrap();
        assert_eq!(x, 0.0);
        assert!(y.abs() < 1e-9);
    }

    #[test]
    fn test_antimeridian_maps_to_origin_shift() {
        let (x, _) = lnglat_to_mercator(180.0, 0.0).unwrap();
        assert!((x - ORIGIN_SHIFT).abs() < 1e-6);
        assert!((ORIGIN_SHIFT - 20037508.342789244).abs() < 1e-6);
    }

    #[test]
    fn test_poles_are_absent() {
        assert!(lnglat_to_mercator(0.0, 90.0).is_none());
        assert!(lnglat_to_mercator(0.0, -90.0).is_none());
        assert!(lnglat_to_mercator(0.0, 91.0).is_none());
        assert!(lnglat_to_mercator(0.0, 89.999).is_some());
    }

    #[test]
    fn test_world_tile_bounds() {
        let b = tile_bounds(&TileCoord::new(0, 0, 0));
        assert_eq!(b.min_x, -ORIGIN_SHIFT);
        assert_eq!(b.max_x, ORIGIN_SHIFT);
        assert_eq!(b.min_y, -ORIGIN_SHIFT);
        assert_eq!(b.max_y, ORIGIN_SHIFT);
    }

    #[test]
    fn test_inverse_projection() {
        let (x, y) = lnglat_to_mercator(-120.2, 38.5).unwrap();
        let (lng, lat) = mercator_to_lnglat(x, y);
        assert!((lng + 120.2).abs() < 1e-9);
        assert!((lat - 38.5).abs() < 1e-9);
    }

    #[test]
    fn test_lnglat_to_tile() {
        assert_eq!(
            lnglat_to_tile(-120.2, 38.5, 10),
            Some(TileCoord::new(10, 170, 393))
        );
        assert_eq!(lnglat_to_tile(180.0, -10.0, 1), Some(TileCoord::new(1, 1, 1)));
        assert_eq!(lnglat_to_tile(0.0, 90.0, 3), None);
        assert_eq!(lnglat_to_tile(0.0, 0.0, 19), None);
    }
}
