//! CRS-tagged points and discrete pixel indices.

use num_traits::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::CrsCode;

/// A point tagged with the CRS its coordinates are expressed in.
///
/// For geographic CRSs `x` is longitude and `y` is latitude (degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
    pub crs: CrsCode,
}

impl Point2D {
    pub fn new(x: f64, y: f64, crs: CrsCode) -> Self {
        Self { x, y, crs }
    }

    /// A WGS84 longitude/latitude point.
    pub fn wgs84(lon: f64, lat: f64) -> Self {
        Self::new(lon, lat, CrsCode::Epsg4326)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Round to the nearest integer with ties going up: `trunc(value + 0.5)`.
///
/// This is not round-half-to-even: `2.5` rounds to `3`. For negative values
/// the truncation toward zero is kept, so `-2.5` rounds to `-2` and `-2.7`
/// also rounds to `-2`. Returns `None` for values that are not finite or do
/// not fit in an `i64`.
pub fn round_half_up(value: f64) -> Option<i64> {
    (value + 0.5).trunc().to_i64()
}

/// Discrete column/row address into a raster grid.
///
/// Only produced by rounding a continuous position, see [`PixelIndex::from_continuous`].
/// May lie outside the raster; use [`PixelIndex::contains`] to bound check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct PixelIndex {
    col: i64,
    row: i64,
}

impl PixelIndex {
    /// Round a continuous (col, row) position to a pixel index.
    pub fn from_continuous(col: f64, row: f64) -> Option<Self> {
        Some(Self {
            col: round_half_up(col)?,
            row: round_half_up(row)?,
        })
    }

    pub fn col(&self) -> i64 {
        self.col
    }

    pub fn row(&self) -> i64 {
        self.row
    }

    /// Check whether the index falls inside a raster of the given size.
    pub fn contains(&self, width: u64, height: u64) -> bool {
        self.col >= 0 && self.row >= 0 && (self.col as u64) < width && (self.row as u64) < height
    }
}
