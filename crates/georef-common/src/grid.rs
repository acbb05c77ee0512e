//! Raster grid georeferencing.

use serde::{Deserialize, Serialize};

use crate::{GeorefError, GeorefResult};

/// Placement of a raster grid in its native projected CRS.
///
/// The origin is the outer corner of pixel (0, 0). Pixel sizes are positive
/// magnitudes; rows increase southward before rotation, which the affine
/// construction applies explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridTransform {
    /// Easting of the grid origin
    pub origin_x: f64,
    /// Northing of the grid origin
    pub origin_y: f64,
    /// Pixel size along the column axis
    pub pixel_width: f64,
    /// Pixel size along the row axis
    pub pixel_height: f64,
    /// Counter-clockwise rotation of the grid from north-up (radians)
    pub rotation_radians: f64,
}

impl GridTransform {
    /// Create a validated grid transform.
    ///
    /// Pixel sizes must be finite and strictly positive; the origin and
    /// rotation must be finite.
    pub fn new(
        origin_x: f64,
        origin_y: f64,
        pixel_width: f64,
        pixel_height: f64,
        rotation_radians: f64,
    ) -> GeorefResult<Self> {
        let grid = Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            rotation_radians,
        };
        grid.validate()?;
        Ok(grid)
    }

    /// Create a north-up grid (no rotation).
    pub fn north_up(
        origin_x: f64,
        origin_y: f64,
        pixel_width: f64,
        pixel_height: f64,
    ) -> GeorefResult<Self> {
        Self::new(origin_x, origin_y, pixel_width, pixel_height, 0.0)
    }

    /// Check the field invariants.
    pub fn validate(&self) -> GeorefResult<()> {
        check_positive("pixel_width", self.pixel_width)?;
        check_positive("pixel_height", self.pixel_height)?;
        check_finite("origin_x", self.origin_x)?;
        check_finite("origin_y", self.origin_y)?;
        check_finite("rotation_radians", self.rotation_radians)?;
        Ok(())
    }

    /// Rotation in degrees.
    pub fn rotation_degrees(&self) -> f64 {
        self.rotation_radians.to_degrees()
    }

    /// Whether the grid is aligned with the CRS axes.
    pub fn is_north_up(&self) -> bool {
        self.rotation_radians == 0.0
    }
}

fn check_finite(field: &str, value: f64) -> GeorefResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GeorefError::malformed(field, format!("must be finite, got {}", value)))
    }
}

fn check_positive(field: &str, value: f64) -> GeorefResult<()> {
    check_finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(GeorefError::malformed(
            field,
            format!("must be strictly positive, got {}", value),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_accepts_valid_grid() {
        let grid = GridTransform::new(500000.0, 4500000.0, 1.0, 1.0, 0.0).unwrap();
        assert!(grid.is_north_up());
        assert_eq!(grid.origin_x, 500000.0);
    }

    #[test]
    fn test_new_rejects_non_positive_pixel_size() {
        let err = GridTransform::north_up(0.0, 0.0, 0.0, 1.0).unwrap_err();
        assert!(matches!(err, GeorefError::MalformedMetadata { ref field, .. } if field == "pixel_width"));

        let err = GridTransform::north_up(0.0, 0.0, 1.0, -30.0).unwrap_err();
        assert!(matches!(err, GeorefError::MalformedMetadata { ref field, .. } if field == "pixel_height"));
    }

    #[test]
    fn test_new_rejects_non_finite() {
        assert!(GridTransform::north_up(f64::NAN, 0.0, 1.0, 1.0).is_err());
        assert!(GridTransform::new(0.0, 0.0, 1.0, 1.0, f64::INFINITY).is_err());
        assert!(GridTransform::north_up(0.0, 0.0, f64::INFINITY, 1.0).is_err());
    }

    #[test]
    fn test_rotation_degrees() {
        let grid = GridTransform::new(0.0, 0.0, 1.0, 1.0, std::f64::consts::FRAC_PI_2).unwrap();
        assert!((grid.rotation_degrees() - 90.0).abs() < 1e-12);
        assert!(!grid.is_north_up());
    }
}
