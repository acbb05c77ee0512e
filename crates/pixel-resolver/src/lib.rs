//! Geographic point to raster pixel/line resolution.
//!
//! The pipeline is linear:
//!
//! ```text
//! query (lon, lat)
//!      │
//!      ├─► Reprojector: query CRS → raster native CRS (skipped when equal)
//!      │
//!      ├─► inverse AffineTransform: (x, y) → continuous (col, row)
//!      │
//!      └─► round_half_up per axis → PixelIndex
//! ```
//!
//! [`resolve`] runs the pipeline once for a single query. [`PixelResolver`]
//! inverts the grid once and then serves many queries, including parallel
//! batches.
//!
//! # Example
//!
//! ```ignore
//! use georef_common::{CrsCode, GridTransform, Point2D};
//! use pixel_resolver::PixelResolver;
//!
//! let grid = GridTransform::north_up(500000.0, 4500000.0, 1.0, 1.0)?;
//! let resolver = PixelResolver::new(grid, CrsCode::UtmWgs84 { zone: 15, north: true })?;
//! let resolution = resolver.resolve(&Point2D::wgs84(-93.0, 40.6))?;
//! println!("col={} row={}", resolution.index.col(), resolution.index.row());
//! ```

pub mod resolver;

pub use resolver::{PixelResolver, Resolution};

use georef_common::{CrsCode, GeorefError, GeorefResult, GridTransform, PixelIndex, Point2D};
use projection::{AffineTransform, BuiltinReprojector, Reprojector};

/// Resolve a query point to the pixel index of `grid` using the built-in reprojector.
pub fn resolve(query: &Point2D, grid: &GridTransform, native_crs: CrsCode) -> GeorefResult<PixelIndex> {
    resolve_with(&BuiltinReprojector::new(), query, grid, native_crs)
}

/// Resolve a query point with a caller-supplied reprojector.
///
/// No bounds check is made; the index may fall outside the raster.
pub fn resolve_with<R: Reprojector + ?Sized>(
    reprojector: &R,
    query: &Point2D,
    grid: &GridTransform,
    native_crs: CrsCode,
) -> GeorefResult<PixelIndex> {
    let native_point = reprojector.reproject(query, native_crs)?;
    let inverse = AffineTransform::from_grid(grid).inverse()?;
    let (col, row) = inverse.forward(native_point.x, native_point.y);
    to_index(col, row)
}

pub(crate) fn to_index(col: f64, row: f64) -> GeorefResult<PixelIndex> {
    PixelIndex::from_continuous(col, row).ok_or(GeorefError::IndexOutOfRange { col, row })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const UTM15N: CrsCode = CrsCode::UtmWgs84 {
        zone: 15,
        north: true,
    };

    /// Counts calls and fails every one.
    #[derive(Default)]
    struct CountingReprojector {
        calls: AtomicUsize,
    }

    impl Reprojector for CountingReprojector {
        fn reproject_point(
            &self,
            x: f64,
            y: f64,
            source: CrsCode,
            _target: CrsCode,
        ) -> GeorefResult<(f64, f64)> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(GeorefError::projection(x, y, source, "stub"))
        }
    }

    fn north_up_1m() -> GridTransform {
        GridTransform::north_up(500000.0, 4500000.0, 1.0, 1.0).unwrap()
    }

    #[test]
    fn test_resolve_native_point() {
        let query = Point2D::new(500010.0, 4499990.0, UTM15N);
        let index = resolve(&query, &north_up_1m(), UTM15N).unwrap();
        assert_eq!((index.col(), index.row()), (10, 10));
    }

    #[test]
    fn test_same_crs_skips_reprojection() {
        let stub = CountingReprojector::default();
        let query = Point2D::new(500010.0, 4499990.0, UTM15N);

        let index = resolve_with(&stub, &query, &north_up_1m(), UTM15N).unwrap();
        assert_eq!((index.col(), index.row()), (10, 10));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 0);

        // A different CRS goes through the reprojector and its error surfaces
        let err = resolve_with(&stub, &Point2D::wgs84(-93.0, 40.0), &north_up_1m(), UTM15N)
            .unwrap_err();
        assert!(matches!(err, GeorefError::ProjectionFailure { .. }));
        assert_eq!(stub.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_ties_round_up() {
        let query = Point2D::new(500002.5, 4499997.5, UTM15N);
        let index = resolve(&query, &north_up_1m(), UTM15N).unwrap();
        assert_eq!((index.col(), index.row()), (3, 3));
    }

    #[test]
    fn test_negative_index_keeps_truncation_bias() {
        // Two and a half pixels left of and above the origin
        let query = Point2D::new(499997.5, 4500002.5, UTM15N);
        let index = resolve(&query, &north_up_1m(), UTM15N).unwrap();
        assert_eq!((index.col(), index.row()), (-2, -2));
    }

    #[test]
    fn test_zero_pixel_size_is_singular() {
        let grid = GridTransform {
            pixel_width: 0.0,
            ..north_up_1m()
        };
        let query = Point2D::new(500010.0, 4499990.0, UTM15N);
        let err = resolve(&query, &grid, UTM15N).unwrap_err();
        assert!(matches!(err, GeorefError::SingularTransform { .. }));
    }

    #[test]
    fn test_unrepresentable_index() {
        let query = Point2D::new(1e300, 4499990.0, UTM15N);
        let err = resolve(&query, &north_up_1m(), UTM15N).unwrap_err();
        assert!(matches!(err, GeorefError::IndexOutOfRange { .. }));
        assert!(!err.is_session_fatal());
    }
}
