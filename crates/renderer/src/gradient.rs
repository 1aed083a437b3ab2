//! Overlap-count color gradients.
//!
//! A gradient is a fixed 256-entry lookup table indexed by the saturated
//! per-pixel overlap count. Tables are built once from a short list of color
//! stops and never change afterwards, so presets live in statics and are
//! shared by every render.

use heatmap_common::{HeatmapError, HeatmapResult};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Number of entries in a gradient table (one per possible `u8` count).
pub const GRADIENT_SIZE: usize = 256;

/// Default count at which the middle color of a custom gradient is reached.
pub const DEFAULT_MIDPOINT: i64 = 10;

/// Color value in RGBA format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn transparent() -> Self {
        Self { r: 0, g: 0, b: 0, a: 0 }
    }

    pub const fn white() -> Self {
        Self::opaque(255, 255, 255)
    }

    /// Parse `RRGGBB` or `RRGGBBAA`, with or without a leading `#`.
    ///
    /// Six digits imply full opacity.
    pub fn from_hex(hex: &str) -> HeatmapResult<Self> {
        let digits = hex.trim_start_matches('#');
        let invalid = || HeatmapError::InvalidColor(hex.to_string());

        if !(digits.len() == 6 || digits.len() == 8)
            || !digits.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(invalid());
        }

        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());

        let a = if digits.len() == 8 { channel(6)? } else { 255 };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Linear color interpolation, truncating each channel.
fn interpolate_color(color1: Color, color2: Color, t: f64) -> Color {
    let t_inv = 1.0 - t;
    let mix = |a: u8, b: u8| ((a as f64 * t_inv) + (b as f64 * t)) as u8;

    Color::new(
        mix(color1.r, color2.r),
        mix(color1.g, color2.g),
        mix(color1.b, color2.b),
        mix(color1.a, color2.a),
    )
}

/// A color anchored at an overlap count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradientStop {
    pub threshold: u8,
    pub color: Color,
}

impl GradientStop {
    pub const fn new(threshold: u8, color: Color) -> Self {
        Self { threshold, color }
    }
}

/// Materialized 256-entry color table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    table: [Color; GRADIENT_SIZE],
}

impl Gradient {
    /// Build the lookup table from ascending stops.
    ///
    /// Indices between two stops are linearly interpolated, indices past the
    /// last stop take its color, and anything before the first stop stays
    /// transparent.
    pub fn from_stops(stops: &[GradientStop]) -> Self {
        let mut table = [Color::transparent(); GRADIENT_SIZE];

        for pair in stops.windows(2) {
            let (start, end) = (pair[0], pair[1]);
            let (i0, i1) = (start.threshold as usize, end.threshold as usize);

            for (idx, slot) in table.iter_mut().enumerate().take(i1 + 1).skip(i0) {
                let t = if i1 > i0 {
                    (idx - i0) as f64 / (i1 - i0) as f64
                } else {
                    0.0
                };
                *slot = interpolate_color(start.color, end.color, t);
            }
        }

        if let Some(last) = stops.last() {
            for slot in &mut table[last.threshold as usize..] {
                *slot = last.color;
            }
        }

        Self { table }
    }

    /// Three-color gradient from hex strings: transparent at 0, `min` at 1,
    /// `mid` at `midpoint` (clamped to `1..=254`) and `max` at 255.
    pub fn from_hex(min: &str, mid: &str, max: &str, midpoint: i64) -> HeatmapResult<Self> {
        let min = Color::from_hex(min)?;
        let mid = Color::from_hex(mid)?;
        let max = Color::from_hex(max)?;
        let midpoint = midpoint.clamp(1, 254) as u8;

        Ok(Self::from_stops(&[
            GradientStop::new(0, Color::transparent()),
            GradientStop::new(1, min),
            GradientStop::new(midpoint, mid),
            GradientStop::new(255, max),
        ]))
    }

    /// Color for an overlap count. Counts above 255 clamp to the last entry.
    pub fn sample(&self, count: u32) -> Color {
        self.table[count.min(255) as usize]
    }

    /// The whole table, index = count.
    pub fn palette(&self) -> &[Color; GRADIENT_SIZE] {
        &self.table
    }
}

/// Built-in gradients selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetGradient {
    Orange,
    Pinkish,
    BlueRed,
    Red,
}

static ORANGE: Lazy<Gradient> = Lazy::new(|| {
    Gradient::from_stops(&[
        GradientStop::new(0, Color::transparent()),
        GradientStop::new(1, Color::opaque(252, 74, 26)),
        GradientStop::new(10, Color::opaque(247, 183, 51)),
    ])
});

static PINKISH: Lazy<Gradient> = Lazy::new(|| {
    Gradient::from_stops(&[
        GradientStop::new(0, Color::transparent()),
        GradientStop::new(1, Color::new(255, 177, 255, 127)),
        GradientStop::new(10, Color::opaque(255, 177, 255)),
        GradientStop::new(50, Color::white()),
    ])
});

static BLUE_RED: Lazy<Gradient> = Lazy::new(|| {
    Gradient::from_stops(&[
        GradientStop::new(0, Color::transparent()),
        GradientStop::new(1, Color::opaque(63, 94, 251)),
        GradientStop::new(10, Color::opaque(252, 70, 107)),
        GradientStop::new(50, Color::white()),
    ])
});

static RED: Lazy<Gradient> = Lazy::new(|| {
    Gradient::from_stops(&[
        GradientStop::new(0, Color::transparent()),
        GradientStop::new(1, Color::opaque(178, 10, 44)),
        GradientStop::new(10, Color::opaque(255, 251, 213)),
        GradientStop::new(50, Color::white()),
    ])
});

impl PresetGradient {
    pub const ALL: [PresetGradient; 4] = [
        PresetGradient::Orange,
        PresetGradient::Pinkish,
        PresetGradient::BlueRed,
        PresetGradient::Red,
    ];

    /// Look up a preset by name. Unknown names get `Orange`.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "pinkish" => Self::Pinkish,
            "blue_red" | "blue-red" => Self::BlueRed,
            "red" => Self::Red,
            _ => Self::Orange,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Orange => "orange",
            Self::Pinkish => "pinkish",
            Self::BlueRed => "blue_red",
            Self::Red => "red",
        }
    }

    pub fn gradient(&self) -> &'static Gradient {
        match self {
            Self::Orange => &ORANGE,
            Self::Pinkish => &PINKISH,
            Self::BlueRed => &BLUE_RED,
            Self::Red => &RED,
        }
    }
}

impl Default for PresetGradient {
    fn default() -> Self {
        Self::Orange
    }
}

/// The gradient a tile request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GradientChoice {
    Preset(PresetGradient),
    Custom(Gradient),
}

impl GradientChoice {
    /// Resolve request parameters.
    ///
    /// A custom gradient is used only when all three colors are given;
    /// otherwise the named preset (default orange) applies.
    pub fn resolve(
        name: Option<&str>,
        min_color: Option<&str>,
        mid_color: Option<&str>,
        max_color: Option<&str>,
        midpoint: Option<i64>,
    ) -> HeatmapResult<Self> {
        match (min_color, mid_color, max_color) {
            (Some(min), Some(mid), Some(max)) => Ok(Self::Custom(Gradient::from_hex(
                min,
                mid,
                max,
                midpoint.unwrap_or(DEFAULT_MIDPOINT),
            )?)),
            _ => Ok(Self::Preset(
                name.map(PresetGradient::from_name).unwrap_or_default(),
            )),
        }
    }

    pub fn gradient(&self) -> &Gradient {
        match self {
            Self::Preset(preset) => preset.gradient(),
            Self::Custom(gradient) => gradient,
        }
    }
}
