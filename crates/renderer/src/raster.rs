//! Track rasterization with per-pixel overlap counting.
//!
//! A [`TileRasterizer`] owns a `size × size` grid of saturating `u8`
//! counters. Every segment of every track that survives the proximity,
//! jump and clipping checks is drawn with Bresenham and bumps the counters
//! it touches. Finishing the rasterizer consumes it and maps counts through
//! a [`Gradient`].

use heatmap_common::{HeatmapResult, MercatorBounds, TileCoord};
use polyline::LngLat;
use projection::{lnglat_to_mercator, tile_bounds};
use rayon::prelude::*;
use tracing::debug;

use crate::gradient::Gradient;
use crate::png::{create_png, create_png_indexed};

/// Default tile edge in pixels.
pub const DEFAULT_TILE_SIZE: usize = 512;

/// Segments with neither endpoint inside the tile grown by this fraction of
/// its larger side are ignored.
pub const SEGMENT_PROXIMITY_MARGIN: f64 = 0.2;

/// Segments longer than this fraction of the tile width are GPS jumps.
pub const MAX_SEGMENT_TILE_FRACTION: f64 = 0.5;

/// Tolerance for clip region tests and boundary snapping (meters).
const CLIP_EPSILON: f64 = 1e-10;

const INSIDE: u8 = 0;
const LEFT: u8 = 1;
const RIGHT: u8 = 2;
const BOTTOM: u8 = 4;
const TOP: u8 = 8;

/// Accumulates overlap counts for one tile.
pub struct TileRasterizer {
    tile: TileCoord,
    bounds: MercatorBounds,
    size: usize,
    counts: Vec<u8>,
}

impl TileRasterizer {
    /// A rasterizer with a `size × size` buffer. Sizes below 1 are raised to 1.
    pub fn new(tile: TileCoord, size: usize) -> Self {
        let size = size.max(1);
        Self {
            tile,
            bounds: tile_bounds(&tile),
            size,
            counts: vec![0; size * size],
        }
    }

    pub fn tile(&self) -> TileCoord {
        self.tile
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn bounds(&self) -> &MercatorBounds {
        &self.bounds
    }

    /// Overlap count at a pixel, `None` outside the tile.
    pub fn count(&self, x: usize, y: usize) -> Option<u8> {
        if x >= self.size || y >= self.size {
            return None;
        }
        Some(self.counts[y * self.size + x])
    }

    pub fn non_zero_pixels(&self) -> usize {
        self.counts.iter().filter(|&&c| c > 0).count()
    }

    /// Draw a decoded track. Returns how many segments touched the buffer.
    ///
    /// Points that cannot be projected are dropped, and the segments on
    /// either side of them are never bridged.
    pub fn add_polyline(&mut self, points: &[LngLat]) -> usize {
        if points.len() < 2 {
            return 0;
        }

        let projected: Vec<(usize, f64, f64)> = points
            .iter()
            .enumerate()
            .filter_map(|(i, p)| lnglat_to_mercator(p.lng, p.lat).map(|(x, y)| (i, x, y)))
            .collect();

        if projected.len() < 2 {
            return 0;
        }

        let b = self.bounds;
        let tile_width = b.width();
        let margin = tile_width.max(b.height()) * SEGMENT_PROXIMITY_MARGIN;
        let near = MercatorBounds::new(
            b.min_x - margin,
            b.min_y - margin,
            b.max_x + margin,
            b.max_y + margin,
        );

        let mut drawn = 0;
        for pair in projected.windows(2) {
            let (i0, x0, y0) = pair[0];
            let (i1, x1, y1) = pair[1];

            if i1 - i0 > 1 {
                continue;
            }
            if !near.contains_point(x0, y0) && !near.contains_point(x1, y1) {
                continue;
            }
            if (x1 - x0).hypot(y1 - y0) > tile_width * MAX_SEGMENT_TILE_FRACTION {
                continue;
            }

            let Some((cx0, cy0, cx1, cy1)) = self.clip_segment(x0, y0, x1, y1) else {
                continue;
            };

            let (px0, py0) = self.to_pixel(cx0, cy0);
            let (px1, py1) = self.to_pixel(cx1, cy1);
            if self.draw_line(px0, py0, px1, py1) {
                drawn += 1;
            }
        }

        drawn
    }

    /// Apply the gradient to every pixel.
    pub fn finish(self, gradient: &Gradient) -> RenderedTile {
        let mut pixels = vec![0u8; self.counts.len() * 4];
        pixels
            .par_chunks_mut(4)
            .zip(self.counts.par_iter())
            .for_each(|(px, &count)| px.copy_from_slice(&gradient.sample(count as u32).to_array()));

        RenderedTile {
            tile: self.tile,
            size: self.size,
            pixels,
        }
    }

    /// Encode straight to an indexed PNG: counts are palette indices and
    /// the palette is the gradient table.
    pub fn encode_png(self, gradient: &Gradient) -> HeatmapResult<Vec<u8>> {
        let png = create_png_indexed(self.size, self.size, gradient.palette(), &self.counts)?;
        debug!(
            tile = %self.tile,
            lit_pixels = self.non_zero_pixels(),
            bytes = png.len(),
            "Encoded tile"
        );
        Ok(png)
    }

    fn region(&self, x: f64, y: f64) -> u8 {
        let b = &self.bounds;
        let mut code = INSIDE;
        if x < b.min_x - CLIP_EPSILON {
            code |= LEFT;
        } else if x > b.max_x + CLIP_EPSILON {
            code |= RIGHT;
        }
        if y < b.min_y - CLIP_EPSILON {
            code |= BOTTOM;
        } else if y > b.max_y + CLIP_EPSILON {
            code |= TOP;
        }
        code
    }

    /// Cohen–Sutherland against the exact tile bounds.
    fn clip_segment(
        &self,
        mut x0: f64,
        mut y0: f64,
        mut x1: f64,
        mut y1: f64,
    ) -> Option<(f64, f64, f64, f64)> {
        let b = self.bounds;
        let mut code0 = self.region(x0, y0);
        let mut code1 = self.region(x1, y1);

        loop {
            if code0 == INSIDE && code1 == INSIDE {
                let (sx0, sy0) = self.snap(x0, y0);
                let (sx1, sy1) = self.snap(x1, y1);
                return Some((sx0, sy0, sx1, sy1));
            }
            if code0 & code1 != 0 {
                return None;
            }

            let out = if code0 != INSIDE { code0 } else { code1 };
            let dx = x1 - x0;
            let dy = y1 - y0;

            let (x, y) = if out & TOP != 0 {
                let x = if dy.abs() > CLIP_EPSILON { x0 + dx * (b.max_y - y0) / dy } else { x0 };
                (x, b.max_y)
            } else if out & BOTTOM != 0 {
                let x = if dy.abs() > CLIP_EPSILON { x0 + dx * (b.min_y - y0) / dy } else { x0 };
                (x, b.min_y)
            } else if out & RIGHT != 0 {
                let y = if dx.abs() > CLIP_EPSILON { y0 + dy * (b.max_x - x0) / dx } else { y0 };
                (b.max_x, y)
            } else {
                let y = if dx.abs() > CLIP_EPSILON { y0 + dy * (b.min_x - x0) / dx } else { y0 };
                (b.min_x, y)
            };

            if out == code0 {
                x0 = x;
                y0 = y;
                code0 = self.region(x0, y0);
            } else {
                x1 = x;
                y1 = y;
                code1 = self.region(x1, y1);
            }
        }
    }

    /// Pull coordinates within epsilon of an edge exactly onto it, so both
    /// neighbours of a tile edge map the point to their edge pixel.
    fn snap(&self, mut x: f64, mut y: f64) -> (f64, f64) {
        let b = &self.bounds;
        if (x - b.min_x).abs() < CLIP_EPSILON {
            x = b.min_x;
        }
        if (x - b.max_x).abs() < CLIP_EPSILON {
            x = b.max_x;
        }
        if (y - b.min_y).abs() < CLIP_EPSILON {
            y = b.min_y;
        }
        if (y - b.max_y).abs() < CLIP_EPSILON {
            y = b.max_y;
        }
        (x, y)
    }

    fn to_pixel(&self, mx: f64, my: f64) -> (i64, i64) {
        let b = &self.bounds;
        let last = (self.size - 1) as f64;

        let px = ((mx - b.min_x) / b.width() * last).round();
        let py = ((b.max_y - my) / b.height() * last).round();

        (px.clamp(0.0, last) as i64, py.clamp(0.0, last) as i64)
    }

    /// Bresenham with saturating increments. Returns false when both ends
    /// land on the same pixel, in which case nothing is drawn.
    fn draw_line(&mut self, x0: i64, y0: i64, x1: i64, y1: i64) -> bool {
        if x0 == x1 && y0 == y1 {
            return false;
        }

        let size = self.size as i64;
        let dx = (x1 - x0).abs();
        let dy = (y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx - dy;
        let (mut x, mut y) = (x0, y0);

        loop {
            if (0..size).contains(&x) && (0..size).contains(&y) {
                let idx = (y * size + x) as usize;
                self.counts[idx] = self.counts[idx].saturating_add(1);
            }

            if x == x1 && y == y1 {
                break;
            }

            let e2 = 2 * err;
            if e2 > -dy {
                err -= dy;
                x += sx;
            }
            if e2 < dx {
                err += dx;
                y += sy;
            }
        }

        true
    }
}

/// A colorized tile, RGBA row-major.
#[derive(Debug, Clone)]
pub struct RenderedTile {
    pub tile: TileCoord,
    pub size: usize,
    pub pixels: Vec<u8>,
}

impl RenderedTile {
    /// RGBA at a pixel.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.size || y >= self.size {
            return None;
        }
        let i = (y * self.size + x) * 4;
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    pub fn is_transparent(&self) -> bool {
        self.pixels.chunks_exact(4).all(|px| px[3] == 0)
    }

    pub fn to_png(&self) -> HeatmapResult<Vec<u8>> {
        create_png(&self.pixels, self.size, self.size)
    }
}
