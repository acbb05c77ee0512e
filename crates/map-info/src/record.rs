//! The ENVI "map info" record.
//!
//! Positional layout:
//!
//! ```text
//! [0] projection name             [6] pixel height
//! [1] reference col (1-based)     [7] UTM zone (UTM only)
//! [2] reference row (1-based)     [8] North / South (UTM only)
//! [3] reference easting           [9] datum
//! [4] reference northing          [..] units=<unit>
//! [5] pixel width                 [..] rotation=<degrees>
//! ```
//!
//! For non-UTM projections the datum follows the pixel size directly. Keyed
//! tokens (`units=`, `rotation=`) are located by key since ENVI drops empty
//! fields.

use georef_common::{CrsCode, GeorefError, GeorefResult, GridTransform};
use projection::AffineTransform;
use serde::Serialize;
use tracing::{debug, warn};

use crate::RawMetadata;

/// Metadata key holding the record.
pub const MAP_INFO_KEY: &str = "map info";

const FIELD_NAMES: [&str; 7] = [
    "projection",
    "reference_col",
    "reference_row",
    "easting",
    "northing",
    "pixel_width",
    "pixel_height",
];

/// Hemisphere of a UTM zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Hemisphere {
    North,
    South,
}

impl Hemisphere {
    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "north" | "n" => Some(Hemisphere::North),
            "south" | "s" => Some(Hemisphere::South),
            _ => None,
        }
    }
}

/// A parsed "map info" record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapInfo {
    /// Projection name, e.g. "UTM" or "Geographic Lat/Lon"
    pub projection: String,
    /// 1-based column of the reference pixel; 1.0 is the left edge of the image
    pub reference_col: f64,
    /// 1-based row of the reference pixel; 1.0 is the top edge of the image
    pub reference_row: f64,
    /// Map x of the reference pixel
    pub easting: f64,
    /// Map y of the reference pixel
    pub northing: f64,
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub zone: Option<u8>,
    pub hemisphere: Option<Hemisphere>,
    pub datum: Option<String>,
    pub units: Option<String>,
    /// Grid rotation in degrees, counter-clockwise from north-up
    pub rotation_deg: f64,
}

impl MapInfo {
    /// Parse the record from the tokens of the "map info" entry.
    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> GeorefResult<Self> {
        let tokens: Vec<&str> = tokens.iter().map(|t| t.as_ref().trim()).collect();

        let projection = tokens
            .first()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| malformed_at(0, "missing"))?
            .to_string();

        let reference_col = number_at(&tokens, 1)?;
        let reference_row = number_at(&tokens, 2)?;
        let easting = number_at(&tokens, 3)?;
        let northing = number_at(&tokens, 4)?;
        let pixel_width = positive_at(&tokens, 5)?;
        let pixel_height = positive_at(&tokens, 6)?;

        // Positional advisory fields, skipping keyed tokens
        let positional: Vec<&str> = tokens[7..]
            .iter()
            .copied()
            .filter(|t| !t.contains('='))
            .collect();

        let is_utm = projection.eq_ignore_ascii_case("utm");
        let (zone, hemisphere, datum) = if is_utm {
            let zone = positional.first().and_then(|z| match z.parse::<u8>() {
                Ok(zone) => Some(zone),
                Err(_) => {
                    warn!(token = %z, "Ignoring unparseable UTM zone in map info");
                    None
                }
            });
            let hemisphere = positional.get(1).and_then(|h| Hemisphere::parse(h));
            (zone, hemisphere, positional.get(2).map(|d| d.to_string()))
        } else {
            (None, None, positional.first().map(|d| d.to_string()))
        };

        let units = keyed(&tokens, "units").map(str::to_string);
        let rotation_deg = match keyed(&tokens, "rotation") {
            Some(value) => value.parse::<f64>().ok().filter(|v| v.is_finite()).ok_or_else(|| {
                GeorefError::malformed("map info rotation", format!("not a number: '{}'", value))
            })?,
            None => 0.0,
        };

        let info = Self {
            projection,
            reference_col,
            reference_row,
            easting,
            northing,
            pixel_width,
            pixel_height,
            zone,
            hemisphere,
            datum,
            units,
            rotation_deg,
        };

        debug!(?info, "Parsed map info");
        Ok(info)
    }

    /// Parse the record from the "map info" entry of a metadata mapping.
    pub fn from_metadata(metadata: &RawMetadata) -> GeorefResult<Self> {
        let tokens = metadata.list(MAP_INFO_KEY)?;
        Self::from_tokens(&tokens)
    }

    /// Grid transform anchored at the outer corner of the first pixel.
    ///
    /// The reference point is moved back along the rotated pixel axes, so a
    /// reference pixel of (1, 1) leaves the easting/northing unchanged.
    pub fn grid_transform(&self) -> GeorefResult<GridTransform> {
        let rotation_radians = self.rotation_deg.to_radians();
        let at_reference = GridTransform::new(
            self.easting,
            self.northing,
            self.pixel_width,
            self.pixel_height,
            rotation_radians,
        )?;

        if self.reference_col == 1.0 && self.reference_row == 1.0 {
            return Ok(at_reference);
        }

        let (origin_x, origin_y) = AffineTransform::from_grid(&at_reference)
            .forward(1.0 - self.reference_col, 1.0 - self.reference_row);

        GridTransform::new(
            origin_x,
            origin_y,
            self.pixel_width,
            self.pixel_height,
            rotation_radians,
        )
    }

    /// The raster's native CRS derived from the projection, zone and datum fields.
    pub fn native_crs(&self) -> GeorefResult<CrsCode> {
        let datum = self.datum.as_deref().unwrap_or("WGS-84");
        let projection = self.projection.to_lowercase();

        if projection == "utm" {
            let zone = self.zone.ok_or_else(|| {
                GeorefError::UnsupportedCrs("UTM map info without a zone".to_string())
            })?;
            let north = self.hemisphere.unwrap_or(Hemisphere::North) == Hemisphere::North;
            return Ok(CrsCode::utm(zone, north, datum)?);
        }

        if projection.starts_with("geographic") {
            let normalized: String = datum
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_uppercase();
            return match normalized.as_str() {
                "WGS84" => Ok(CrsCode::Epsg4326),
                "NAD83" | "NORTHAMERICA1983" => Ok(CrsCode::Epsg4269),
                _ => Err(GeorefError::UnsupportedCrs(format!(
                    "{} on datum '{}'",
                    self.projection, datum
                ))),
            };
        }

        Err(GeorefError::UnsupportedCrs(format!(
            "map info projection '{}'",
            self.projection
        )))
    }
}

fn malformed_at(index: usize, message: impl Into<String>) -> GeorefError {
    GeorefError::malformed(
        format!("map info[{}] ({})", index, FIELD_NAMES[index]),
        message,
    )
}

fn number_at(tokens: &[&str], index: usize) -> GeorefResult<f64> {
    let token = tokens
        .get(index)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| malformed_at(index, "missing"))?;

    match token.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(malformed_at(index, format!("not a number: '{}'", token))),
    }
}

fn positive_at(tokens: &[&str], index: usize) -> GeorefResult<f64> {
    let value = number_at(tokens, index)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(malformed_at(
            index,
            format!("must be strictly positive, got {}", value),
        ))
    }
}

/// Value of a `key=value` token, matched case-insensitively.
fn keyed<'a>(tokens: &[&'a str], key: &str) -> Option<&'a str> {
    tokens.iter().find_map(|t| {
        let (k, v) = t.split_once('=')?;
        k.trim().eq_ignore_ascii_case(key).then_some(v.trim())
    })
}
