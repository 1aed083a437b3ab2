//! Tests for PNG encoding functionality.
//!
//! Encoded images are decoded back with the `image` crate to check that
//! both encoders produce valid PNGs with the expected pixels.

use renderer::gradient::{Color, PresetGradient};
use renderer::png::{create_png, create_png_indexed, transparent_tile_png};

// ============================================================================
// Helper functions
// ============================================================================

fn decode(png: &[u8]) -> image::RgbaImage {
    image::load_from_memory_with_format(png, image::ImageFormat::Png)
        .expect("valid PNG")
        .to_rgba8()
}

/// Counts spread over the first few gradient entries, like a real tile.
fn stripe_counts(width: usize, height: usize) -> Vec<u8> {
    (0..width * height)
        .map(|i| ((i % width) / 8 % 12) as u8)
        .collect()
}

// ============================================================================
// Indexed PNG tests
// ============================================================================

#[test]
fn test_indexed_png_decodes_to_palette_colors() {
    let gradient = PresetGradient::Orange.gradient();
    let counts = stripe_counts(64, 16);

    let png = create_png_indexed(64, 16, gradient.palette(), &counts).unwrap();
    let img = decode(&png);

    assert_eq!(img.dimensions(), (64, 16));
    for (i, pixel) in img.pixels().enumerate() {
        assert_eq!(pixel.0, gradient.sample(counts[i] as u32).to_array());
    }
}

#[test]
fn test_indexed_png_keeps_partial_alpha() {
    let palette = [Color::transparent(), Color::new(255, 177, 255, 127)];
    let png = create_png_indexed(2, 1, &palette, &[1, 0]).unwrap();
    let img = decode(&png);

    assert_eq!(img.get_pixel(0, 0).0, [255, 177, 255, 127]);
    assert_eq!(img.get_pixel(1, 0).0[3], 0);
}

#[test]
fn test_non_square_indexed_png() {
    let palette = [Color::opaque(0, 0, 0), Color::white()];
    let indices: Vec<u8> = (0..3 * 5).map(|i| (i % 2) as u8).collect();
    let img = decode(&create_png_indexed(3, 5, &palette, &indices).unwrap());

    assert_eq!(img.dimensions(), (3, 5));
    assert_eq!(img.get_pixel(1, 0).0, [255, 255, 255, 255]);
    assert_eq!(img.get_pixel(0, 1).0, [255, 255, 255, 255]);
}

// ============================================================================
// RGBA PNG tests
// ============================================================================

#[test]
fn test_rgba_png_roundtrips_pixels() {
    let pixels: Vec<u8> = (0..8 * 8)
        .flat_map(|i| [i as u8, (i * 3) as u8, 255 - i as u8, (i * 4) as u8])
        .collect();

    let img = decode(&create_png(&pixels, 8, 8).unwrap());
    assert_eq!(img.as_raw(), &pixels);
}

// ============================================================================
// Transparent tile
// ============================================================================

#[test]
fn test_transparent_tile() {
    let png = transparent_tile_png(512).unwrap();
    let img = decode(&png);

    assert_eq!(img.dimensions(), (512, 512));
    assert!(img.pixels().all(|p| p.0[3] == 0));
}

#[test]
fn test_transparent_tile_is_small_and_stable() {
    let a = transparent_tile_png(512).unwrap();
    let b = transparent_tile_png(512).unwrap();

    assert_eq!(a, b);
    assert!(a.len() < 16 * 1024, "transparent tile is {} bytes", a.len());
}
