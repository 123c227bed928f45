//! Polyline representation for route geometries.
//!
//! Stores latitude/longitude points directly for internal processing;
//! decoding from the compact encoded format happens at the OSRM boundary,
//! never inside the candidate pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A polyline as decoded (latitude, longitude) coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    points: Vec<(f64, f64)>,
}

/// Malformed encoded-polyline input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    offset: usize,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "truncated or invalid polyline at byte {}", self.offset)
    }
}

impl std::error::Error for DecodeError {}

impl Polyline {
    /// Creates a new Polyline from decoded coordinate points.
    pub fn new(points: Vec<(f64, f64)>) -> Self {
        Self { points }
    }

    /// Decode the Google encoded-polyline format (1e-5 precision).
    pub fn decode(encoded: &str) -> Result<Self, DecodeError> {
        let bytes = encoded.as_bytes();
        let mut points = Vec::new();
        let mut index = 0usize;
        let mut lat = 0i64;
        let mut lng = 0i64;

        while index < bytes.len() {
            lat += decode_value(bytes, &mut index)?;
            lng += decode_value(bytes, &mut index)?;
            points.push((lat as f64 / 1e5, lng as f64 / 1e5));
        }

        Ok(Self { points })
    }

    /// Returns a reference to the coordinate points.
    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    /// Consumes the polyline and returns the owned coordinate points.
    pub fn into_points(self) -> Vec<(f64, f64)> {
        self.points
    }
}

/// One zigzag-encoded varint from the byte stream.
fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i64, DecodeError> {
    let start = *index;
    let mut result = 0i64;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(*index).ok_or(DecodeError { offset: start })?;
        if !(63..=127).contains(&byte) {
            return Err(DecodeError { offset: *index });
        }
        *index += 1;
        let chunk = i64::from(byte - 63);
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
        if shift > 35 {
            return Err(DecodeError { offset: start });
        }
    }

    if result & 1 == 1 {
        Ok(!(result >> 1))
    } else {
        Ok(result >> 1)
    }
}
