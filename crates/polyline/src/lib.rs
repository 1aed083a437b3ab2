//! Encoded polyline codec.
//!
//! Tracks arrive from the activity provider as compact polyline strings:
//! each point is a pair of signed deltas (latitude first, then longitude),
//! scaled by `1e5`, zig-zag shifted and written as 5-bit groups offset by 63
//! with `0x20` marking continuation.
//!
//! Decoded points are returned in `(lng, lat)` order even though the wire
//! order is `(lat, lng)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fixed-point scale of the format (5 decimal places).
const PRECISION: f64 = 1e5;

/// Offset added to every 5-bit group to land in printable ASCII.
const CHAR_OFFSET: u8 = 63;

/// Continuation flag on all but the last group of a value.
const CONTINUATION: i64 = 0x20;

/// Payload bits of a group.
const CHUNK_MASK: i64 = 0x1f;

/// Values are capped at 7 groups (35 bits).
const MAX_SHIFT: u32 = 35;

/// A WGS84 position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }
}

impl From<(f64, f64)> for LngLat {
    fn from((lng, lat): (f64, f64)) -> Self {
        Self { lng, lat }
    }
}

/// Errors produced while decoding a polyline string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolylineError {
    #[error("polyline ends mid-codeword at byte {offset}")]
    Truncated { offset: usize },

    #[error("invalid polyline character {byte:#04x} at byte {offset}")]
    InvalidCharacter { offset: usize, byte: u8 },

    #[error("polyline value starting before byte {offset} exceeds 35 bits")]
    Overflow { offset: usize },
}

/// Decode a polyline string into `(lng, lat)` points.
///
/// An empty string decodes to an empty sequence. Input that stops in the
/// middle of a value, or after a latitude with no longitude, is rejected
/// with [`PolylineError::Truncated`].
pub fn decode(encoded: &str) -> Result<Vec<LngLat>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut coords = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        lat += read_value(bytes, &mut index)?;
        lng += read_value(bytes, &mut index)?;

        coords.push(LngLat::new(lng as f64 / PRECISION, lat as f64 / PRECISION));
    }

    Ok(coords)
}

/// Encode `(lng, lat)` points into a polyline string.
///
/// Coordinates are rounded to 5 decimal places, so anything finer is lost.
pub fn encode(coords: &[LngLat]) -> String {
    let mut encoded = String::with_capacity(coords.len() * 8);
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in coords {
        let lat = (point.lat * PRECISION).round() as i64;
        let lng = (point.lng * PRECISION).round() as i64;

        write_value(&mut encoded, lat - prev_lat);
        write_value(&mut encoded, lng - prev_lng);

        prev_lat = lat;
        prev_lng = lng;
    }

    encoded
}

/// Read one zig-zag encoded signed value starting at `index`.
fn read_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let start = *index;
    let mut result: i64 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated { offset: *index });
        };
        if !(CHAR_OFFSET..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                offset: *index,
                byte,
            });
        }
        if shift >= MAX_SHIFT {
            return Err(PolylineError::Overflow { offset: start });
        }

        let chunk = (byte - CHAR_OFFSET) as i64;
        *index += 1;

        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk < CONTINUATION {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

fn write_value(out: &mut String, value: i64) {
    let mut v = if value < 0 { !(value << 1) } else { value << 1 };

    while v >= CONTINUATION {
        out.push(((CONTINUATION | (v & CHUNK_MASK)) as u8 + CHAR_OFFSET) as char);
        v >>= 5;
    }
    out.push((v as u8 + CHAR_OFFSET) as char);
}
