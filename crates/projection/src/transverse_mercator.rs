//! Transverse Mercator projection.
//!
//! Used by UTM, which divides the globe into 60 zones of 6° longitude.
//! Each zone projects a cylinder tangent along its central meridian onto a
//! flat plane. Formulas follow the Snyder series expansion, which is
//! accurate to well under a meter within a zone.
//!
//! The projection parameters include:
//! - Central meridian (lon0)
//! - Scale factor on the central meridian (k0, 0.9996 for UTM)
//! - False easting/northing (500 km, and 10 000 km in the south for UTM)

use std::f64::consts::PI;

use georef_common::{Crs, CrsKind, Ellipsoid};

/// Transverse Mercator projection parameters.
#[derive(Debug, Clone, Copy)]
pub struct TransverseMercator {
    /// Central meridian in radians
    pub lon0: f64,
    /// Scale factor on the central meridian
    pub k0: f64,
    /// False easting (meters)
    pub false_easting: f64,
    /// False northing (meters)
    pub false_northing: f64,
    /// Semi-major axis (meters)
    pub a: f64,
    /// First eccentricity squared
    e2: f64,
    /// Second eccentricity squared
    ep2: f64,
}

impl TransverseMercator {
    pub fn new(
        central_meridian_deg: f64,
        k0: f64,
        false_easting: f64,
        false_northing: f64,
        ellipsoid: Ellipsoid,
    ) -> Self {
        let e2 = ellipsoid.e2();

        Self {
            lon0: central_meridian_deg.to_radians(),
            k0,
            false_easting,
            false_northing,
            a: ellipsoid.semi_major,
            e2,
            ep2: e2 / (1.0 - e2),
        }
    }

    /// Create a WGS84 UTM projection for a zone and hemisphere.
    pub fn utm(zone: u8, north: bool) -> Self {
        let lon0 = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;
        let false_northing = if north { 0.0 } else { 10_000_000.0 };
        Self::new(lon0, 0.9996, 500_000.0, false_northing, Ellipsoid::WGS84)
    }

    /// Build from a resolved CRS; `None` for non-Transverse Mercator CRSs.
    pub fn from_crs(crs: &Crs) -> Option<Self> {
        match crs.kind {
            CrsKind::TransverseMercator {
                central_meridian,
                scale_factor,
                false_easting,
                false_northing,
            } => Some(Self::new(
                central_meridian,
                scale_factor,
                false_easting,
                false_northing,
                crs.ellipsoid,
            )),
            CrsKind::Geographic => None,
        }
    }

    /// Central meridian in degrees.
    pub fn central_meridian(&self) -> f64 {
        self.lon0.to_degrees()
    }

    /// Longitude offset from the central meridian, normalized to [-180, 180] degrees.
    pub fn meridian_offset(&self, lon_deg: f64) -> f64 {
        normalize_radians(lon_deg.to_radians() - self.lon0).to_degrees()
    }

    /// Convert geographic coordinates (lat/lon in degrees) to easting/northing.
    ///
    /// The series is only accurate near the central meridian; callers are
    /// expected to bound the longitude offset.
    pub fn geo_to_projected(&self, lat_deg: f64, lon_deg: f64) -> (f64, f64) {
        let lat = lat_deg.to_radians();
        let dlon = normalize_radians(lon_deg.to_radians() - self.lon0);

        let e2 = self.e2;
        let ep2 = self.ep2;
        let (sin_lat, cos_lat) = lat.sin_cos();
        let tan_lat = lat.tan();

        let n = self.a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let t = tan_lat * tan_lat;
        let c = ep2 * cos_lat * cos_lat;
        let a = dlon * cos_lat;

        let m = self.meridian_arc(lat);

        let x = self.k0
            * n
            * (a + (1.0 - t + c) * a.powi(3) / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a.powi(5) / 120.0)
            + self.false_easting;

        let y = self.k0
            * (m + n
                * tan_lat
                * (a * a / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a.powi(4) / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a.powi(6) / 720.0))
            + self.false_northing;

        (x, y)
    }

    /// Convert easting/northing to geographic coordinates.
    ///
    /// Returns (lat, lon) in degrees, longitude normalized to [-180, 180].
    pub fn projected_to_geo(&self, x: f64, y: f64) -> (f64, f64) {
        let x = x - self.false_easting;
        let y = y - self.false_northing;

        let e2 = self.e2;
        let ep2 = self.ep2;
        let e1 = (1.0 - (1.0 - e2).sqrt()) / (1.0 + (1.0 - e2).sqrt());

        // Footpoint latitude
        let m = y / self.k0;
        let mu = m / (self.a * (1.0 - e2 / 4.0 - 3.0 * e2 * e2 / 64.0 - 5.0 * e2.powi(3) / 256.0));

        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = phi1.tan();
        let n1 = self.a / (1.0 - e2 * sin_phi1 * sin_phi1).sqrt();
        let t1 = tan_phi1 * tan_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let r1 = self.a * (1.0 - e2) / (1.0 - e2 * sin_phi1 * sin_phi1).powf(1.5);
        let d = x / (n1 * self.k0);

        let lat = phi1
            - (n1 * tan_phi1 / r1)
                * (d * d / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d.powi(4) / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d.powi(6)
                        / 720.0);

        let lon = self.lon0
            + (d - (1.0 + 2.0 * t1 + c1) * d.powi(3) / 6.0
                + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1)
                    * d.powi(5)
                    / 120.0)
                / cos_phi1;

        (lat.to_degrees(), normalize_radians(lon).to_degrees())
    }

    /// Distance along the central meridian from the equator to `lat` (radians).
    fn meridian_arc(&self, lat: f64) -> f64 {
        let e2 = self.e2;
        let e4 = e2 * e2;
        let e6 = e4 * e2;

        self.a
            * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * lat
                - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * lat).sin()
                + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * lat).sin()
                - (35.0 * e6 / 3072.0) * (6.0 * lat).sin())
    }
}

/// Wrap an angle into [-π, π). Non-finite angles come back as NaN.
fn normalize_radians(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}
