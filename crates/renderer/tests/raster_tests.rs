//! Integration tests for track rasterization.

use heatmap_common::TileCoord;
use polyline::LngLat;
use projection::{lnglat_to_tile, mercator_to_lnglat, tile_bounds};
use renderer::{PresetGradient, TileRasterizer, DEFAULT_TILE_SIZE};

const REFERENCE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

fn rasterize(tile: TileCoord, tracks: &[Vec<LngLat>]) -> TileRasterizer {
    let mut r = TileRasterizer::new(tile, DEFAULT_TILE_SIZE);
    for track in tracks {
        r.add_polyline(track);
    }
    r
}

/// Point at a fractional position inside a tile (0,0 = north-west corner).
fn point_in(tile: &TileCoord, fx: f64, fy: f64) -> LngLat {
    let b = tile_bounds(tile);
    let (lng, lat) = mercator_to_lnglat(b.min_x + b.width() * fx, b.max_y - b.height() * fy);
    LngLat::new(lng, lat)
}

/// Straight track between two fractional positions, split into short
/// segments so none of them counts as a GPS jump.
fn line_in(tile: &TileCoord, from: (f64, f64), to: (f64, f64)) -> Vec<LngLat> {
    const STEPS: usize = 8;
    (0..=STEPS)
        .map(|i| {
            let t = i as f64 / STEPS as f64;
            point_in(
                tile,
                from.0 + (to.0 - from.0) * t,
                from.1 + (to.1 - from.1) * t,
            )
        })
        .collect()
}

fn column_rows(r: &TileRasterizer, x: usize) -> Vec<usize> {
    (0..r.size()).filter(|&y| r.count(x, y).unwrap_or(0) > 0).collect()
}

fn row_columns(r: &TileRasterizer, y: usize) -> Vec<usize> {
    (0..r.size()).filter(|&x| r.count(x, y).unwrap_or(0) > 0).collect()
}

// ============================================================================
// Seams between neighbouring tiles
// ============================================================================

#[test]
fn test_track_crossing_vertical_edge_lights_both_sides() {
    let track = vec![LngLat::new(-122.40, 37.75), LngLat::new(-122.29, 37.76)];
    let west = TileCoord::new(10, 163, 395);
    let east = TileCoord::new(10, 164, 395);
    assert_eq!(lnglat_to_tile(-122.40, 37.75, 10), Some(west));
    assert_eq!(lnglat_to_tile(-122.29, 37.76, 10), Some(east));

    let w = rasterize(west, &[track.clone()]);
    let e = rasterize(east, &[track]);

    let west_edge = column_rows(&w, DEFAULT_TILE_SIZE - 1);
    let east_edge = column_rows(&e, 0);
    assert!(!west_edge.is_empty());
    assert!(!east_edge.is_empty());
    assert!(west_edge.iter().any(|y| east_edge.contains(y)));
}

#[test]
fn test_track_crossing_horizontal_edge_lights_both_sides() {
    let track = vec![LngLat::new(-122.50, 37.76), LngLat::new(-122.49, 37.68)];
    let north = TileCoord::new(10, 163, 395);
    let south = TileCoord::new(10, 163, 396);
    assert_eq!(lnglat_to_tile(-122.50, 37.76, 10), Some(north));
    assert_eq!(lnglat_to_tile(-122.49, 37.68, 10), Some(south));

    let n = rasterize(north, &[track.clone()]);
    let s = rasterize(south, &[track]);

    let north_edge = row_columns(&n, DEFAULT_TILE_SIZE - 1);
    let south_edge = row_columns(&s, 0);
    assert!(!north_edge.is_empty());
    assert!(!south_edge.is_empty());
    assert!(north_edge.iter().any(|x| south_edge.contains(x)));
}

// ============================================================================
// Overlap counting
// ============================================================================

#[test]
fn test_overlapping_tracks_accumulate() {
    let tile = TileCoord::new(14, 2621, 6333);
    let track = line_in(&tile, (0.1, 0.3), (0.9, 0.3));

    let r = rasterize(tile, &[track.clone(), track.clone(), track]);
    let row = (0.3 * (DEFAULT_TILE_SIZE - 1) as f64).round() as usize;
    assert_eq!(r.count(230, row), Some(3));
}

#[test]
fn test_counts_saturate_at_255() {
    let tile = TileCoord::new(14, 2621, 6333);
    let track = vec![point_in(&tile, 0.25, 0.6), point_in(&tile, 0.65, 0.6)];

    let mut r = TileRasterizer::new(tile, DEFAULT_TILE_SIZE);
    for _ in 0..300 {
        assert_eq!(r.add_polyline(&track), 1);
    }

    let row = (0.6 * (DEFAULT_TILE_SIZE - 1) as f64).round() as usize;
    let lit = row_columns(&r, row);
    assert!(!lit.is_empty());
    for x in lit {
        assert_eq!(r.count(x, row), Some(255));
    }
}

#[test]
fn test_segment_leaving_tile_is_clipped_not_dropped() {
    let tile = TileCoord::new(14, 2621, 6333);
    let track = vec![point_in(&tile, 0.8, 0.25), point_in(&tile, 1.1, 0.25)];

    let r = rasterize(tile, &[track]);
    assert!(r.count(DEFAULT_TILE_SIZE - 1, 128).unwrap() > 0);
}

// ============================================================================
// Pole handling
// ============================================================================

#[test]
fn test_pole_point_is_never_bridged() {
    let tile = TileCoord::new(14, 2621, 6333);
    let a = point_in(&tile, 0.3, 0.5);
    let b = point_in(&tile, 0.7, 0.5);

    let mut r = TileRasterizer::new(tile, DEFAULT_TILE_SIZE);
    assert_eq!(r.add_polyline(&[a, LngLat::new(a.lng, 90.0), b]), 0);
    assert_eq!(r.non_zero_pixels(), 0);

    assert_eq!(r.add_polyline(&[a, b]), 1);
}

#[test]
fn test_segments_around_pole_point_still_draw() {
    let tile = TileCoord::new(14, 2621, 6333);
    let track = [
        point_in(&tile, 0.3, 0.2),
        point_in(&tile, 0.7, 0.2),
        LngLat::new(0.0, -90.0),
        point_in(&tile, 0.3, 0.8),
        point_in(&tile, 0.7, 0.8),
    ];

    let mut r = TileRasterizer::new(tile, DEFAULT_TILE_SIZE);
    assert_eq!(r.add_polyline(&track), 2);
}

// ============================================================================
// End to end
// ============================================================================

#[test]
fn test_reference_track_renders_at_low_zoom() {
    let points = polyline::decode(REFERENCE_POLYLINE).unwrap();
    assert_eq!(points[0], LngLat::new(-120.2, 38.5));

    let tile = lnglat_to_tile(-120.2, 38.5, 5).unwrap();
    assert_eq!(tile, TileCoord::new(5, 5, 12));

    let mut r = TileRasterizer::new(tile, DEFAULT_TILE_SIZE);
    assert!(r.add_polyline(&points) >= 1);
    assert!(r.non_zero_pixels() > 0);

    let png = r.encode_png(PresetGradient::Orange.gradient()).unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (512, 512));
    assert!(img.pixels().any(|p| p.0[3] > 0));
}

#[test]
fn test_reference_track_segments_are_jumps_at_zoom_10() {
    let points = polyline::decode(REFERENCE_POLYLINE).unwrap();
    let tile = lnglat_to_tile(-120.2, 38.5, 10).unwrap();

    let mut r = TileRasterizer::new(tile, DEFAULT_TILE_SIZE);
    assert_eq!(r.add_polyline(&points), 0);
}

#[test]
fn test_far_tile_stays_transparent() {
    let points = polyline::decode(REFERENCE_POLYLINE).unwrap();
    let mut r = TileRasterizer::new(TileCoord::new(10, 0, 0), DEFAULT_TILE_SIZE);
    assert_eq!(r.add_polyline(&points), 0);

    let tile = r.finish(PresetGradient::Orange.gradient());
    assert!(tile.is_transparent());
    assert_eq!(tile.pixels.len(), 512 * 512 * 4);
}

#[test]
fn test_decoded_pixels_match_gradient_samples() {
    let tile = TileCoord::new(14, 2621, 6333);
    let tracks = vec![
        line_in(&tile, (0.1, 0.1), (0.9, 0.9)),
        line_in(&tile, (0.1, 0.9), (0.9, 0.1)),
        line_in(&tile, (0.45, 0.0), (0.45, 1.0)),
    ];
    let gradient = PresetGradient::Pinkish.gradient();

    let r = rasterize(tile, &tracks);
    let counts: Vec<u8> = (0..DEFAULT_TILE_SIZE * DEFAULT_TILE_SIZE)
        .map(|i| r.count(i % DEFAULT_TILE_SIZE, i / DEFAULT_TILE_SIZE).unwrap())
        .collect();
    assert!(counts.iter().any(|&c| c >= 2));

    let png = r.encode_png(gradient).unwrap();
    let img = image::load_from_memory(&png).unwrap().to_rgba8();

    for (i, pixel) in img.pixels().enumerate() {
        assert_eq!(pixel.0, gradient.sample(counts[i] as u32).to_array());
    }
}

#[test]
fn test_indexed_and_rgba_paths_agree() {
    let tile = TileCoord::new(14, 2621, 6333);
    let tracks = vec![line_in(&tile, (0.1, 0.4), (0.7, 0.6))];
    let gradient = PresetGradient::BlueRed.gradient();

    let indexed = rasterize(tile, &tracks).encode_png(gradient).unwrap();
    let rgba = rasterize(tile, &tracks).finish(gradient).to_png().unwrap();

    let a = image::load_from_memory(&indexed).unwrap().to_rgba8();
    let b = image::load_from_memory(&rgba).unwrap().to_rgba8();
    assert_eq!(a.as_raw(), b.as_raw());
}

#[test]
fn test_zero_size_is_raised_to_one_pixel() {
    let tile = TileCoord::new(0, 0, 0);
    let mut rasterizer = TileRasterizer::new(tile, 0);
    assert_eq!(rasterizer.size(), 1);

    rasterizer.add_polyline(&[LngLat::new(-10.0, -10.0), LngLat::new(10.0, 10.0)]);
    let png = rasterizer.encode_png(PresetGradient::Orange.gradient()).unwrap();
    let img = image::load_from_memory(&png).unwrap();
    assert_eq!((img.width(), img.height()), (1, 1));
}
