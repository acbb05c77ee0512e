//! 2-D affine transforms between pixel and map space.
//!
//! A transform maps a continuous pixel position (col, row) to map
//! coordinates (x, y):
//!
//! ```text
//! x = a + b*col + c*row
//! y = d + e*col + f*row
//! ```
//!
//! Coefficient order matches the GDAL geotransform `[a, b, c, d, e, f]`.

use georef_common::{GeorefError, GeorefResult, GridTransform};
use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};

/// Relative tolerance for the determinant, scaled by the squared magnitude
/// of the linear part.
const SINGULAR_TOLERANCE: f64 = 1e-12;

/// The six coefficients of an affine map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineCoefficients {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

/// An affine map from (col, row) to (x, y).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    coeffs: AffineCoefficients,
}

impl AffineTransform {
    pub fn new(coeffs: AffineCoefficients) -> Self {
        Self { coeffs }
    }

    pub fn identity() -> Self {
        Self::from_gdal([0.0, 1.0, 0.0, 0.0, 0.0, 1.0])
    }

    /// Build the pixel-to-map transform of a grid.
    ///
    /// Column steps follow the rotated east axis and row steps the rotated
    /// south axis, so with zero rotation row indices grow southward.
    pub fn from_grid(grid: &GridTransform) -> Self {
        let (sin, cos) = grid.rotation_radians.sin_cos();

        Self::new(AffineCoefficients {
            a: grid.origin_x,
            b: cos * grid.pixel_width,
            c: sin * grid.pixel_height,
            d: grid.origin_y,
            e: sin * grid.pixel_width,
            f: -cos * grid.pixel_height,
        })
    }

    /// Create from a GDAL-style geotransform array.
    pub fn from_gdal(gt: [f64; 6]) -> Self {
        Self::new(AffineCoefficients {
            a: gt[0],
            b: gt[1],
            c: gt[2],
            d: gt[3],
            e: gt[4],
            f: gt[5],
        })
    }

    /// Convert to a GDAL-style geotransform array.
    pub fn to_gdal(&self) -> [f64; 6] {
        let k = &self.coeffs;
        [k.a, k.b, k.c, k.d, k.e, k.f]
    }

    pub fn coefficients(&self) -> AffineCoefficients {
        self.coeffs
    }

    /// Apply the transform to a (col, row) position.
    #[inline]
    pub fn forward(&self, col: f64, row: f64) -> (f64, f64) {
        let k = &self.coeffs;
        (k.a + k.b * col + k.c * row, k.d + k.e * col + k.f * row)
    }

    /// Determinant of the linear part.
    pub fn determinant(&self) -> f64 {
        let k = &self.coeffs;
        k.b * k.f - k.c * k.e
    }

    /// Closed-form inverse.
    ///
    /// Fails with `SingularTransform` when the linear part has (numerically)
    /// zero area, so the result never carries NaN or infinite coefficients.
    pub fn inverse(&self) -> GeorefResult<Self> {
        let k = &self.coeffs;
        let det = self.determinant();
        let scale = k.b.abs().max(k.c.abs()).max(k.e.abs()).max(k.f.abs());

        if !det.is_finite() || !(scale > 0.0) || det.abs() < SINGULAR_TOLERANCE * scale * scale {
            return Err(GeorefError::SingularTransform { determinant: det });
        }

        let inv = AffineCoefficients {
            a: (k.c * k.d - k.f * k.a) / det,
            b: k.f / det,
            c: -k.c / det,
            d: (k.e * k.a - k.b * k.d) / det,
            e: -k.e / det,
            f: k.b / det,
        };

        let finite = [inv.a, inv.b, inv.c, inv.d, inv.e, inv.f]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(GeorefError::SingularTransform { determinant: det });
        }

        Ok(Self::new(inv))
    }

    /// Homogeneous 3x3 matrix form.
    pub fn to_matrix(&self) -> Matrix3<f64> {
        let k = &self.coeffs;
        Matrix3::new(k.b, k.c, k.a, k.e, k.f, k.d, 0.0, 0.0, 1.0)
    }

    /// Build from a homogeneous matrix; the bottom row is ignored.
    pub fn from_matrix(m: &Matrix3<f64>) -> Self {
        Self::new(AffineCoefficients {
            a: m[(0, 2)],
            b: m[(0, 0)],
            c: m[(0, 1)],
            d: m[(1, 2)],
            e: m[(1, 0)],
            f: m[(1, 1)],
        })
    }

    /// The transform that applies `other` first, then `self`.
    pub fn compose(&self, other: &AffineTransform) -> Self {
        Self::from_matrix(&(self.to_matrix() * other.to_matrix()))
    }
}
