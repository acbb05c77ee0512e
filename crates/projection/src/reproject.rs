//! Point reprojection between coordinate reference systems.

use georef_common::{Crs, CrsCode, GeorefError, GeorefResult, Point2D};
use tracing::debug;

use crate::TransverseMercator;

/// Widest longitude offset from a Transverse Mercator central meridian that
/// is still projected. Within it the series round trip stays under 1e-6°.
const MAX_MERIDIAN_OFFSET_DEG: f64 = 5.0;

/// Largest |easting - false easting| accepted for inverse projection.
const MAX_EASTING_OFFSET_M: f64 = 1_000_000.0;

/// Largest |northing - false northing| accepted for inverse projection,
/// a little over the equator-to-pole meridian arc.
const MAX_NORTHING_OFFSET_M: f64 = 10_100_000.0;

/// Capability to move coordinates between CRSs.
///
/// Implementations must be pure: the same inputs always give the same
/// output, and they may be shared across threads.
pub trait Reprojector: Send + Sync {
    /// Reproject raw coordinates from `source` to `target`.
    ///
    /// Geographic coordinates are (longitude, latitude) in degrees.
    fn reproject_point(
        &self,
        x: f64,
        y: f64,
        source: CrsCode,
        target: CrsCode,
    ) -> GeorefResult<(f64, f64)>;

    /// Reproject a tagged point. A point already in `target` is returned untouched.
    fn reproject(&self, point: &Point2D, target: CrsCode) -> GeorefResult<Point2D> {
        if point.crs == target {
            return Ok(*point);
        }

        let (x, y) = self.reproject_point(point.x, point.y, point.crs, target)?;
        Ok(Point2D::new(x, y, target))
    }
}

/// Pure-Rust reprojector for geographic and UTM CRSs.
///
/// WGS84 and NAD83 are treated as coincident; they differ by about a meter
/// in North America.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinReprojector;

impl BuiltinReprojector {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a CRS identifier string, failing with `UnsupportedCrs`.
    pub fn resolve(&self, code: &str) -> GeorefResult<Crs> {
        let code: CrsCode = code.parse()?;
        Ok(Crs::new(code))
    }

    /// Reproject between CRSs named by identifier strings.
    pub fn reproject_codes(
        &self,
        x: f64,
        y: f64,
        source: &str,
        target: &str,
    ) -> GeorefResult<(f64, f64)> {
        let source = self.resolve(source)?;
        let target = self.resolve(target)?;
        self.reproject_point(x, y, source.code, target.code)
    }

    /// Inverse-project into (lon, lat) degrees.
    fn unproject(&self, x: f64, y: f64, crs: &Crs) -> GeorefResult<(f64, f64)> {
        match TransverseMercator::from_crs(crs) {
            None => {
                check_geographic(x, y, crs)?;
                Ok((x, y))
            }
            Some(tm) => {
                if (x - tm.false_easting).abs() > MAX_EASTING_OFFSET_M
                    || (y - tm.false_northing).abs() > MAX_NORTHING_OFFSET_M
                {
                    return Err(GeorefError::projection(
                        x,
                        y,
                        crs.code,
                        "coordinate is far outside the projection's zone",
                    ));
                }

                let (lat, lon) = tm.projected_to_geo(x, y);
                if !lat.is_finite() || !lon.is_finite() || lat.abs() > 90.0 {
                    return Err(GeorefError::projection(
                        x,
                        y,
                        crs.code,
                        "coordinate has no geographic position in this projection",
                    ));
                }
                check_meridian_offset(&tm, x, y, lon, crs)?;
                Ok((lon, lat))
            }
        }
    }

    /// Forward-project (lon, lat) degrees into `crs`.
    fn project(&self, lon: f64, lat: f64, crs: &Crs) -> GeorefResult<(f64, f64)> {
        check_geographic(lon, lat, crs)?;

        let (min_lat, max_lat) = crs.valid_latitudes();
        if lat < min_lat || lat > max_lat {
            return Err(GeorefError::projection(
                lon,
                lat,
                crs.code,
                format!("latitude outside [{}, {}]", min_lat, max_lat),
            ));
        }

        match TransverseMercator::from_crs(crs) {
            None => Ok((lon, lat)),
            Some(tm) => {
                check_meridian_offset(&tm, lon, lat, lon, crs)?;

                let (x, y) = tm.geo_to_projected(lat, lon);
                if !x.is_finite() || !y.is_finite() {
                    return Err(GeorefError::projection(
                        lon,
                        lat,
                        crs.code,
                        "projection produced a non-finite coordinate",
                    ));
                }
                Ok((x, y))
            }
        }
    }
}

/// Longitude in [-180, 180] and latitude in [-90, 90].
fn check_geographic(lon: f64, lat: f64, crs: &Crs) -> GeorefResult<()> {
    if !(-180.0..=180.0).contains(&lon) {
        return Err(GeorefError::projection(
            lon,
            lat,
            crs.code,
            "longitude outside [-180, 180]",
        ));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(GeorefError::projection(
            lon,
            lat,
            crs.code,
            "latitude outside [-90, 90]",
        ));
    }
    Ok(())
}

/// Reject longitudes too far from the central meridian for the series.
/// `(x, y)` is the input reported in the error.
fn check_meridian_offset(
    tm: &TransverseMercator,
    x: f64,
    y: f64,
    lon: f64,
    crs: &Crs,
) -> GeorefResult<()> {
    let offset = tm.meridian_offset(lon);
    if offset.abs() <= MAX_MERIDIAN_OFFSET_DEG {
        return Ok(());
    }
    Err(GeorefError::projection(
        x,
        y,
        crs.code,
        format!(
            "longitude is {:.3}° from central meridian {}°, beyond the {}° limit",
            offset,
            tm.central_meridian(),
            MAX_MERIDIAN_OFFSET_DEG
        ),
    ))
}

impl Reprojector for BuiltinReprojector {
    fn reproject_point(
        &self,
        x: f64,
        y: f64,
        source: CrsCode,
        target: CrsCode,
    ) -> GeorefResult<(f64, f64)> {
        if !x.is_finite() || !y.is_finite() {
            return Err(GeorefError::projection(x, y, source, "input is not finite"));
        }

        let source_crs = Crs::new(source);
        let target_crs = Crs::new(target);

        let (lon, lat) = self.unproject(x, y, &source_crs)?;
        let out = self.project(lon, lat, &target_crs)?;

        debug!(
            source = %source,
            target = %target,
            x,
            y,
            out_x = out.0,
            out_y = out.1,
            "Reprojected point"
        );

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::fixtures::points;

    const UTM15N: CrsCode = CrsCode::UtmWgs84 {
        zone: 15,
        north: true,
    };

    #[test]
    fn test_geographic_to_utm() {
        let r = BuiltinReprojector::new();
        let (lon, lat) = points::MADISON;
        let (x, y) = r.reproject_point(lon, lat, CrsCode::Epsg4326, UTM15N).unwrap();
        assert!((x - 792_529.0).abs() < 5.0, "easting: {}", x);
        assert!((y - 4_778_066.0).abs() < 5.0, "northing: {}", y);
    }

    #[test]
    fn test_utm_to_geographic_roundtrip() {
        let r = BuiltinReprojector::new();
        let (lon, lat) = points::MADISON;
        let (x, y) = r.reproject_point(lon, lat, CrsCode::Epsg4326, UTM15N).unwrap();
        let (lon2, lat2) = r.reproject_point(x, y, UTM15N, CrsCode::Epsg4326).unwrap();
        assert!((lon2 - lon).abs() < 1e-6);
        assert!((lat2 - lat).abs() < 1e-6);
    }

    #[test]
    fn test_utm_to_utm_via_geographic() {
        let r = BuiltinReprojector::new();
        let utm16n = CrsCode::UtmWgs84 { zone: 16, north: true };
        let (lon, lat) = points::MADISON;

        let (x15, y15) = r.reproject_point(lon, lat, CrsCode::Epsg4326, UTM15N).unwrap();
        let (x16, y16) = r.reproject_point(x15, y15, UTM15N, utm16n).unwrap();
        let (direct_x, direct_y) = r.reproject_point(lon, lat, CrsCode::Epsg4326, utm16n).unwrap();

        assert!((x16 - direct_x).abs() < 0.01);
        assert!((y16 - direct_y).abs() < 0.01);
        // Madison sits in zone 16, west of its central meridian
        assert!(x16 < 500_000.0);
    }

    #[test]
    fn test_antipode_is_projection_failure() {
        let r = BuiltinReprojector::new();
        let (lon, lat) = points::ZONE15_ANTIPODE;
        let err = r.reproject_point(lon, lat, CrsCode::Epsg4326, UTM15N).unwrap_err();
        assert!(matches!(err, GeorefError::ProjectionFailure { .. }));
        assert!(!err.is_session_fatal());
    }

    #[test]
    fn test_out_of_range_latitude() {
        let r = BuiltinReprojector::new();
        assert!(matches!(
            r.reproject_point(-93.0, 89.0, CrsCode::Epsg4326, UTM15N),
            Err(GeorefError::ProjectionFailure { .. })
        ));
        assert!(matches!(
            r.reproject_point(-93.0, 91.0, CrsCode::Epsg4326, CrsCode::Epsg4269),
            Err(GeorefError::ProjectionFailure { .. })
        ));
    }

    #[test]
    fn test_huge_longitude_fails_promptly() {
        let r = BuiltinReprojector::new();
        let err = r
            .reproject_point(1e20, 40.0, CrsCode::Epsg4326, UTM15N)
            .unwrap_err();
        assert!(matches!(err, GeorefError::ProjectionFailure { ref reason, .. } if reason.contains("longitude")));

        assert!(matches!(
            r.reproject_point(-181.0, 40.0, CrsCode::Epsg4326, CrsCode::Epsg4269),
            Err(GeorefError::ProjectionFailure { .. })
        ));
    }

    #[test]
    fn test_huge_easting_fails_promptly() {
        let r = BuiltinReprojector::new();
        for (x, y) in [(1e60, 0.0), (500_000.0, 1e60), (-1e20, 4_500_000.0)] {
            let err = r
                .reproject_point(x, y, UTM15N, CrsCode::Epsg4326)
                .unwrap_err();
            assert!(matches!(err, GeorefError::ProjectionFailure { .. }), "({}, {})", x, y);
        }
    }

    #[test]
    fn test_far_off_zone_is_rejected() {
        let r = BuiltinReprojector::new();
        for offset in [10.0, 30.0, 60.0] {
            let lon = -93.0 + offset;
            let err = r
                .reproject_point(lon, 30.0, CrsCode::Epsg4326, UTM15N)
                .unwrap_err();
            assert!(matches!(err, GeorefError::ProjectionFailure { .. }), "offset {}", offset);
        }

        // Eastings that invert to a longitude far off the zone
        let err = r
            .reproject_point(1_400_000.0, 3_300_000.0, UTM15N, CrsCode::Epsg4326)
            .unwrap_err();
        assert!(matches!(err, GeorefError::ProjectionFailure { .. }));
    }

    #[test]
    fn test_zone_edge_round_trips() {
        let r = BuiltinReprojector::new();
        for lat in [-79.0, -30.0, 0.0, 30.0, 83.0] {
            for lon in [-97.9, -88.1] {
                let (x, y) = r.reproject_point(lon, lat, CrsCode::Epsg4326, UTM15N).unwrap();
                let (lon2, lat2) = r.reproject_point(x, y, UTM15N, CrsCode::Epsg4326).unwrap();
                assert!((lon2 - lon).abs() < 1e-6, "lon {} -> {}", lon, lon2);
                assert!((lat2 - lat).abs() < 1e-6, "lat {} -> {}", lat, lat2);
            }
        }
    }

    #[test]
    fn test_non_finite_input() {
        let r = BuiltinReprojector::new();
        assert!(matches!(
            r.reproject_point(f64::NAN, 43.0, CrsCode::Epsg4326, UTM15N),
            Err(GeorefError::ProjectionFailure { .. })
        ));
    }

    #[test]
    fn test_unknown_code_is_unsupported() {
        let r = BuiltinReprojector::new();
        let err = r
            .reproject_codes(-89.4, 43.1, "EPSG:4326", "EPSG:3857")
            .unwrap_err();
        assert!(matches!(err, GeorefError::UnsupportedCrs(ref c) if c == "EPSG:3857"));

        let (x, _) = r
            .reproject_codes(-93.0, 0.0, "EPSG:4326", "EPSG:32615")
            .unwrap();
        assert!((x - 500_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_crs_is_untouched() {
        let r = BuiltinReprojector::new();
        let p = Point2D::new(500010.123456789, 4499990.987654321, UTM15N);
        let out = r.reproject(&p, UTM15N).unwrap();
        assert_eq!(out.x.to_bits(), p.x.to_bits());
        assert_eq!(out.y.to_bits(), p.y.to_bits());
    }
}
