//! Heatmap tile rendering.
//!
//! - Gradient lookup tables (presets and custom hex gradients)
//! - Track rasterization with overlap counting
//! - PNG encoding

pub mod gradient;
pub mod png;
pub mod raster;

pub use gradient::{Color, Gradient, GradientChoice, GradientStop, PresetGradient};
pub use raster::{RenderedTile, TileRasterizer, DEFAULT_TILE_SIZE};
