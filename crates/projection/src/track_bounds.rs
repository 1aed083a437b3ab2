//! Bounding boxes of encoded tracks in Web Mercator meters.
//!
//! Computed once when a track is ingested and used by storage as a spatial
//! pre-filter. Pole points cannot be projected and are skipped.

use heatmap_common::MercatorBounds;
use polyline::LngLat;
use tracing::debug;

use crate::mercator::lnglat_to_mercator;

/// Bounding box of an encoded polyline.
///
/// `None` when the string is empty, fails to decode, or every point lies on
/// a pole.
pub fn bbox_of(encoded: &str) -> Option<MercatorBounds> {
    match polyline::decode(encoded) {
        Ok(points) => bbox_of_points(&points),
        Err(e) => {
            debug!(error = %e, "Skipping bbox for undecodable polyline");
            None
        }
    }
}

/// Bounding box of already decoded points.
pub fn bbox_of_points(points: &[LngLat]) -> Option<MercatorBounds> {
    let mut projected = points
        .iter()
        .filter_map(|p| lnglat_to_mercator(p.lng, p.lat));

    let (x, y) = projected.next()?;
    let mut bounds = MercatorBounds::from_point(x, y);
    for (x, y) in projected {
        bounds.include_point(x, y);
    }

    Some(bounds)
}
