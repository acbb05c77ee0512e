//! Per-image resolution session.

use georef_common::{CrsCode, GeorefResult, GridTransform, PixelIndex, Point2D};
use map_info::{MapInfo, RawMetadata};
use projection::{AffineTransform, BuiltinReprojector, Reprojector};
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::to_index;

/// Outcome of resolving one query point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Resolution {
    /// The point as queried
    pub query: Point2D,
    /// The query expressed in the raster's native CRS
    pub native_point: Point2D,
    /// Continuous column before rounding
    pub col_f: f64,
    /// Continuous row before rounding
    pub row_f: f64,
    pub index: PixelIndex,
    /// Whether the index falls inside the raster, when its size is known
    pub inside: Option<bool>,
}

/// Resolves query points against a single georeferenced raster.
///
/// The grid is inverted once at construction; every query after that costs
/// one optional reprojection plus a handful of float operations. Sessions
/// are immutable and may be shared across threads.
#[derive(Debug, Clone)]
pub struct PixelResolver<R = BuiltinReprojector> {
    grid: GridTransform,
    native_crs: CrsCode,
    forward: AffineTransform,
    inverse: AffineTransform,
    dimensions: Option<(u64, u64)>,
    reprojector: R,
}

impl PixelResolver<BuiltinReprojector> {
    /// Create a session using the built-in reprojector.
    pub fn new(grid: GridTransform, native_crs: CrsCode) -> GeorefResult<Self> {
        Self::with_reprojector(grid, native_crs, BuiltinReprojector::new())
    }

    /// Create a session from dataset metadata.
    ///
    /// The native CRS is taken from `native_crs` when given, otherwise it is
    /// derived from the "map info" record. Raster dimensions are picked up
    /// from `samples`/`lines` when present.
    pub fn from_metadata(metadata: &RawMetadata, native_crs: Option<CrsCode>) -> GeorefResult<Self> {
        let info = MapInfo::from_metadata(metadata)?;
        let grid = info.grid_transform()?;
        let native_crs = match native_crs {
            Some(code) => code,
            None => info.native_crs()?,
        };

        let resolver = Self::new(grid, native_crs)?;
        Ok(match metadata.dimensions() {
            Some((width, height)) => resolver.with_dimensions(width, height),
            None => resolver,
        })
    }
}

impl<R: Reprojector> PixelResolver<R> {
    /// Create a session with a caller-supplied reprojector.
    ///
    /// Fails with `SingularTransform` when the grid has no inverse.
    pub fn with_reprojector(grid: GridTransform, native_crs: CrsCode, reprojector: R) -> GeorefResult<Self> {
        let forward = AffineTransform::from_grid(&grid);
        let inverse = forward.inverse().map_err(|e| {
            warn!(?grid, error = %e, "Rejected grid transform");
            e
        })?;

        info!(
            native_crs = %native_crs,
            origin_x = grid.origin_x,
            origin_y = grid.origin_y,
            pixel_width = grid.pixel_width,
            pixel_height = grid.pixel_height,
            rotation_deg = grid.rotation_degrees(),
            "Created pixel resolver"
        );

        Ok(Self {
            grid,
            native_crs,
            forward,
            inverse,
            dimensions: None,
            reprojector,
        })
    }

    /// Record the raster size so resolutions report whether they are inside.
    pub fn with_dimensions(mut self, width: u64, height: u64) -> Self {
        self.dimensions = Some((width, height));
        self
    }

    pub fn grid(&self) -> &GridTransform {
        &self.grid
    }

    pub fn native_crs(&self) -> CrsCode {
        self.native_crs
    }

    /// Raster size as (width, height), if known.
    pub fn dimensions(&self) -> Option<(u64, u64)> {
        self.dimensions
    }

    /// The map-to-pixel transform.
    pub fn inverse(&self) -> &AffineTransform {
        &self.inverse
    }

    /// Resolve one query point.
    pub fn resolve(&self, query: &Point2D) -> GeorefResult<Resolution> {
        let native_point = self.reprojector.reproject(query, self.native_crs)?;
        let (col_f, row_f) = self.inverse.forward(native_point.x, native_point.y);
        let index = to_index(col_f, row_f)?;
        let inside = self
            .dimensions
            .map(|(width, height)| index.contains(width, height));

        debug!(
            query_x = query.x,
            query_y = query.y,
            native_x = native_point.x,
            native_y = native_point.y,
            col_f,
            row_f,
            col = index.col(),
            row = index.row(),
            "Resolved point"
        );

        Ok(Resolution {
            query: *query,
            native_point,
            col_f,
            row_f,
            index,
            inside,
        })
    }

    /// Resolve many query points in parallel.
    ///
    /// Results keep the order of `queries`; one failing query does not
    /// affect the others.
    pub fn resolve_batch(&self, queries: &[Point2D]) -> Vec<GeorefResult<Resolution>> {
        let results: Vec<_> = queries.par_iter().map(|q| self.resolve(q)).collect();

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(total = queries.len(), failed, "Some points could not be resolved");
        }
        results
    }

    /// Native CRS position of a continuous (col, row) location.
    pub fn pixel_to_native(&self, col: f64, row: f64) -> Point2D {
        let (x, y) = self.forward.forward(col, row);
        Point2D::new(x, y, self.native_crs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use georef_common::GeorefError;
    use test_utils::fixtures::{self, headers, points};
    use test_utils::{assert_approx_eq, assert_coords_approx_eq};

    const UTM15N: CrsCode = CrsCode::UtmWgs84 {
        zone: 15,
        north: true,
    };

    fn north_up_resolver() -> PixelResolver {
        let grid = GridTransform::north_up(500000.0, 4500000.0, 1.0, 1.0).unwrap();
        PixelResolver::new(grid, UTM15N).unwrap()
    }

    fn rotated_resolver() -> PixelResolver {
        let grid = MapInfo::from_tokens(&fixtures::map_info::ROTATED_AVIRIS)
            .unwrap()
            .grid_transform()
            .unwrap();
        PixelResolver::new(grid, UTM15N).unwrap()
    }

    #[test]
    fn test_resolve_native_point() {
        let resolution = north_up_resolver()
            .resolve(&Point2D::new(500010.0, 4499990.0, UTM15N))
            .unwrap();

        assert_eq!((resolution.index.col(), resolution.index.row()), (10, 10));
        assert_eq!(resolution.col_f, 10.0);
        assert_eq!(resolution.row_f, 10.0);
        assert_eq!(resolution.inside, None);
    }

    #[test]
    fn test_same_crs_is_bit_identical() {
        let query = Point2D::new(500010.123456789, 4499990.987654321, UTM15N);
        let resolution = north_up_resolver().resolve(&query).unwrap();
        assert_eq!(resolution.native_point.x.to_bits(), query.x.to_bits());
        assert_eq!(resolution.native_point.y.to_bits(), query.y.to_bits());
    }

    #[test]
    fn test_resolve_rotated_grid() {
        let resolver = rotated_resolver();

        for (col, row) in [(0.0, 0.0), (100.0, 200.0), (597.0, 3325.0), (12.0, 1800.0)] {
            let native = resolver.pixel_to_native(col, row);
            let resolution = resolver.resolve(&native).unwrap();
            let (got_col, got_row) = (resolution.col_f, resolution.row_f);
            assert_coords_approx_eq!((got_col, got_row), (col, row), 1e-6);
            assert_eq!(resolution.index.col(), col as i64);
            assert_eq!(resolution.index.row(), row as i64);
        }
    }

    #[test]
    fn test_resolve_geographic_query() {
        let resolver = rotated_resolver();
        let (lon, lat) = points::MADISON;
        let resolution = resolver.resolve(&Point2D::wgs84(lon, lat)).unwrap();

        assert_eq!(resolution.native_point.crs, UTM15N);
        assert!((resolution.native_point.x - 792_529.0).abs() < 5.0);

        // The continuous position maps back onto the reprojected point
        let back = resolver.pixel_to_native(resolution.col_f, resolution.row_f);
        assert_approx_eq!(back.x, resolution.native_point.x, 1e-6);
        assert_approx_eq!(back.y, resolution.native_point.y, 1e-6);
    }

    #[test]
    fn test_singular_grid_fails_construction() {
        let grid = GridTransform {
            pixel_height: 0.0,
            ..*north_up_resolver().grid()
        };
        let err = PixelResolver::new(grid, UTM15N).unwrap_err();
        assert!(matches!(err, GeorefError::SingularTransform { .. }));
        assert!(err.is_session_fatal());
    }

    #[test]
    fn test_per_query_error_keeps_session_usable() {
        let resolver = north_up_resolver();
        let (lon, lat) = points::ZONE15_ANTIPODE;

        let err = resolver.resolve(&Point2D::wgs84(lon, lat)).unwrap_err();
        assert!(matches!(err, GeorefError::ProjectionFailure { .. }));
        assert!(!err.is_session_fatal());

        assert!(resolver
            .resolve(&Point2D::new(500010.0, 4499990.0, UTM15N))
            .is_ok());
    }

    #[test]
    fn test_out_of_domain_queries_fail() {
        let resolver = north_up_resolver();
        for query in [
            Point2D::wgs84(1e20, 40.0),
            Point2D::wgs84(-63.0, 30.0),
            Point2D::new(1e60, 0.0, CrsCode::UtmWgs84 { zone: 16, north: true }),
        ] {
            let err = resolver.resolve(&query).unwrap_err();
            assert!(matches!(err, GeorefError::ProjectionFailure { .. }), "{:?}", query);
        }
    }

    #[test]
    fn test_resolve_batch_preserves_order() {
        let resolver = north_up_resolver();
        let (lon, lat) = points::ZONE15_ANTIPODE;
        let queries: Vec<Point2D> = (0..50)
            .map(|i| Point2D::new(500000.0 + i as f64, 4499990.0, UTM15N))
            .chain(std::iter::once(Point2D::wgs84(lon, lat)))
            .collect();

        let results = resolver.resolve_batch(&queries);
        assert_eq!(results.len(), 51);
        for (i, result) in results.iter().take(50).enumerate() {
            assert_eq!(result.as_ref().unwrap().index.col(), i as i64);
        }
        assert!(results[50].is_err());
    }

    #[test]
    fn test_from_metadata() {
        let metadata = RawMetadata::from_envi_header(headers::NORTH_UP_HDR).unwrap();
        let resolver = PixelResolver::from_metadata(&metadata, None).unwrap();

        assert_eq!(resolver.native_crs(), UTM15N);
        assert_eq!(resolver.dimensions(), Some((100, 100)));

        let inside = resolver
            .resolve(&Point2D::new(500010.0, 4499990.0, UTM15N))
            .unwrap();
        assert_eq!(inside.inside, Some(true));

        let outside = resolver
            .resolve(&Point2D::new(500200.0, 4499990.0, UTM15N))
            .unwrap();
        assert_eq!(outside.inside, Some(false));
    }

    #[test]
    fn test_from_metadata_native_override() {
        let metadata = RawMetadata::from_envi_header(headers::NORTH_UP_HDR).unwrap();
        let utm16n = CrsCode::UtmWgs84 {
            zone: 16,
            north: true,
        };
        let resolver = PixelResolver::from_metadata(&metadata, Some(utm16n)).unwrap();
        assert_eq!(resolver.native_crs(), utm16n);
    }

    #[test]
    fn test_from_metadata_without_map_info() {
        let metadata = RawMetadata::from_envi_header(headers::NO_MAP_INFO_HDR).unwrap();
        let err = PixelResolver::from_metadata(&metadata, None).unwrap_err();
        assert!(matches!(err, GeorefError::MalformedMetadata { .. }));
    }
}
