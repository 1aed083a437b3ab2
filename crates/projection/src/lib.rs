//! Coordinate transformations between WGS84 and Web Mercator.
//!
//! Implements the spherical Web Mercator projection from scratch without
//! external dependencies. Every tile-space computation in the workspace goes
//! through [`mercator`] so adjacent tiles agree bit-for-bit on shared edges.

pub mod mercator;
pub mod track_bounds;

pub use mercator::{
    lnglat_to_mercator, lnglat_to_tile, mercator_to_lnglat, tile_bounds, EARTH_RADIUS,
    ORIGIN_SHIFT,
};
pub use track_bounds::{bbox_of, bbox_of_points};
