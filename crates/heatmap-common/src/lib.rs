//! Common types and utilities shared across the track heatmap crates.

pub mod bbox;
pub mod error;
pub mod filters;
pub mod tile;

pub use bbox::MercatorBounds;
pub use error::{HeatmapError, HeatmapResult};
pub use filters::TrackFilters;
pub use tile::{TileCoord, MAX_ZOOM};
