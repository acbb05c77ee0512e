//! Coordinate Reference System types and utilities.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CRS codes understood by the built-in reprojector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// NAD83 Geographic
    Epsg4269,
    /// WGS84 / UTM zone (EPSG:326zz north, EPSG:327zz south)
    UtmWgs84 { zone: u8, north: bool },
    /// NAD83 / UTM zone north (EPSG:269zz, zones 1-23)
    UtmNad83 { zone: u8 },
}

impl CrsCode {
    /// Look up a CRS by its numeric EPSG code.
    pub fn from_epsg(code: u32) -> Result<Self, CrsParseError> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            4269 => Ok(CrsCode::Epsg4269),
            32601..=32660 => Ok(CrsCode::UtmWgs84 {
                zone: (code - 32600) as u8,
                north: true,
            }),
            32701..=32760 => Ok(CrsCode::UtmWgs84 {
                zone: (code - 32700) as u8,
                north: false,
            }),
            26901..=26923 => Ok(CrsCode::UtmNad83 {
                zone: (code - 26900) as u8,
            }),
            _ => Err(CrsParseError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    /// Build a UTM code from a zone number, hemisphere and datum name.
    ///
    /// Datum names follow the ENVI header convention ("WGS-84", "North America 1983").
    pub fn utm(zone: u8, north: bool, datum: &str) -> Result<Self, CrsParseError> {
        if !(1..=60).contains(&zone) {
            return Err(CrsParseError::UnsupportedCrs(format!(
                "UTM zone {} ({})",
                zone, datum
            )));
        }

        let normalized: String = datum
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_uppercase();

        match normalized.as_str() {
            "WGS84" | "" => Ok(CrsCode::UtmWgs84 { zone, north }),
            "NAD83" | "NORTHAMERICA1983" if north && zone <= 23 => Ok(CrsCode::UtmNad83 { zone }),
            _ => Err(CrsParseError::UnsupportedCrs(format!(
                "UTM zone {}{} on datum '{}'",
                zone,
                if north { 'N' } else { 'S' },
                datum
            ))),
        }
    }

    /// Numeric EPSG code.
    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg4269 => 4269,
            CrsCode::UtmWgs84 { zone, north: true } => 32600 + *zone as u32,
            CrsCode::UtmWgs84 { zone, north: false } => 32700 + *zone as u32,
            CrsCode::UtmNad83 { zone } => 26900 + *zone as u32,
        }
    }

    /// Check if this is a geographic (lon/lat) CRS.
    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326 | CrsCode::Epsg4269)
    }

    /// The ellipsoid this CRS is defined on.
    pub fn ellipsoid(&self) -> Ellipsoid {
        match self {
            CrsCode::Epsg4326 | CrsCode::UtmWgs84 { .. } => Ellipsoid::WGS84,
            CrsCode::Epsg4269 | CrsCode::UtmNad83 { .. } => Ellipsoid::GRS80,
        }
    }
}

impl FromStr for CrsCode {
    type Err = CrsParseError;

    /// Parse a CRS string.
    ///
    /// Accepts formats like:
    /// - "EPSG:32615"
    /// - "epsg:4326"
    /// - "CRS:84" (WGS84 with lon/lat axis order)
    /// - "4326"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_uppercase();

        if normalized == "CRS:84" || normalized == "WGS84" {
            return Ok(CrsCode::Epsg4326);
        }

        let digits = normalized.strip_prefix("EPSG:").unwrap_or(&normalized);
        let code: u32 = digits
            .parse()
            .map_err(|_| CrsParseError::UnsupportedCrs(s.to_string()))?;

        CrsCode::from_epsg(code)
    }
}

impl TryFrom<String> for CrsCode {
    type Error = CrsParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<CrsCode> for String {
    fn from(code: CrsCode) -> Self {
        code.to_string()
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// Reference ellipsoid parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    /// Semi-major axis (meters)
    pub semi_major: f64,
    /// Inverse flattening
    pub inv_flattening: f64,
}

impl Ellipsoid {
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major: 6_378_137.0,
        inv_flattening: 298.257_223_563,
    };

    pub const GRS80: Ellipsoid = Ellipsoid {
        semi_major: 6_378_137.0,
        inv_flattening: 298.257_222_101,
    };

    /// First eccentricity squared.
    pub fn e2(&self) -> f64 {
        let f = 1.0 / self.inv_flattening;
        2.0 * f - f * f
    }
}

/// Projection family of a resolved CRS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CrsKind {
    /// Longitude/latitude in degrees
    Geographic,
    /// Transverse Mercator with the given parameters
    TransverseMercator {
        /// Central meridian (degrees)
        central_meridian: f64,
        /// Scale factor at the central meridian
        scale_factor: f64,
        /// False easting (meters)
        false_easting: f64,
        /// False northing (meters)
        false_northing: f64,
    },
}

/// Full CRS definition with projection parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crs {
    pub code: CrsCode,
    pub ellipsoid: Ellipsoid,
    pub kind: CrsKind,
}

impl Crs {
    /// Resolve the projection parameters for a code.
    pub fn new(code: CrsCode) -> Self {
        let kind = match code {
            CrsCode::Epsg4326 | CrsCode::Epsg4269 => CrsKind::Geographic,
            CrsCode::UtmWgs84 { zone, north } => utm_kind(zone, north),
            CrsCode::UtmNad83 { zone } => utm_kind(zone, true),
        };

        Self {
            code,
            ellipsoid: code.ellipsoid(),
            kind,
        }
    }

    /// Valid latitude range (degrees) for forward projection into this CRS.
    pub fn valid_latitudes(&self) -> (f64, f64) {
        match self.kind {
            CrsKind::Geographic => (-90.0, 90.0),
            CrsKind::TransverseMercator { .. } => (-80.0, 84.0),
        }
    }
}

fn utm_kind(zone: u8, north: bool) -> CrsKind {
    CrsKind::TransverseMercator {
        central_meridian: (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0,
        scale_factor: 0.9996,
        false_easting: 500_000.0,
        false_northing: if north { 0.0 } else { 10_000_000.0 },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrsParseError {
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!("EPSG:4326".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert_eq!("crs:84".parse::<CrsCode>().unwrap(), CrsCode::Epsg4326);
        assert_eq!(
            "epsg:32615".parse::<CrsCode>().unwrap(),
            CrsCode::UtmWgs84 { zone: 15, north: true }
        );
        assert_eq!(
            "32733".parse::<CrsCode>().unwrap(),
            CrsCode::UtmWgs84 { zone: 33, north: false }
        );
        assert_eq!(
            "EPSG:26915".parse::<CrsCode>().unwrap(),
            CrsCode::UtmNad83 { zone: 15 }
        );
        assert!("EPSG:99999".parse::<CrsCode>().is_err());
        assert!("EPSG:32661".parse::<CrsCode>().is_err());
        assert!("not a crs".parse::<CrsCode>().is_err());
    }

    #[test]
    fn test_display_roundtrip() {
        for code in [4326, 4269, 32601, 32660, 32715, 26910] {
            let crs = CrsCode::from_epsg(code).unwrap();
            assert_eq!(crs.epsg(), code);
            assert_eq!(crs.to_string().parse::<CrsCode>().unwrap(), crs);
        }
    }

    #[test]
    fn test_utm_from_datum() {
        assert_eq!(
            CrsCode::utm(15, true, "WGS-84").unwrap(),
            CrsCode::UtmWgs84 { zone: 15, north: true }
        );
        assert_eq!(
            CrsCode::utm(15, true, "North America 1983").unwrap(),
            CrsCode::UtmNad83 { zone: 15 }
        );
        assert!(CrsCode::utm(0, true, "WGS-84").is_err());
        assert!(CrsCode::utm(15, true, "Clarke 1866").is_err());
    }

    #[test]
    fn test_utm_parameters() {
        let crs = Crs::new(CrsCode::UtmWgs84 { zone: 15, north: false });
        match crs.kind {
            CrsKind::TransverseMercator {
                central_meridian,
                false_northing,
                ..
            } => {
                assert_eq!(central_meridian, -93.0);
                assert_eq!(false_northing, 10_000_000.0);
            }
            other => panic!("expected transverse mercator, got {:?}", other),
        }
        assert_eq!(Crs::new(CrsCode::Epsg4326).kind, CrsKind::Geographic);
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&CrsCode::UtmWgs84 { zone: 15, north: true }).unwrap();
        assert_eq!(json, "\"EPSG:32615\"");
        let parsed: CrsCode = serde_json::from_str("\"EPSG:4269\"").unwrap();
        assert_eq!(parsed, CrsCode::Epsg4269);
    }
}
