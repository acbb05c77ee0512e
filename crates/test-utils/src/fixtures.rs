//! Common test fixtures for geo-pixel tests.
//!
//! Sample georeferencing records that represent the shapes of metadata
//! seen in practice: north-up UTM scenes, rotated airborne flight lines,
//! and the broken records parsers must reject.

use std::io::Write;

use tempfile::NamedTempFile;

/// "map info" token lists as they appear in ENVI headers.
pub mod map_info {
    /// North-up 1 m grid anchored at (500000, 4500000), UTM 15N.
    pub const NORTH_UP_1M: [&str; 11] = [
        "UTM", "1", "1", "500000.0", "4500000.0", "1.0", "1.0", "15", "North", "WGS-84",
        "units=Meters",
    ];

    /// Rotated AVIRIS-NG style flight line in UTM 15N (Madison, WI area).
    pub const ROTATED_AVIRIS: [&str; 12] = [
        "UTM",
        "1",
        "1",
        "791800.0",
        "4779500.0",
        "5.1",
        "5.1",
        "15",
        "North",
        "WGS-84",
        "units=Meters",
        "rotation=75.0",
    ];

    /// Southern hemisphere scene in UTM 33S.
    pub const SOUTH_30M: [&str; 11] = [
        "UTM", "1", "1", "399960.0", "7500040.0", "30.0", "30.0", "33", "South", "WGS-84",
        "units=Meters",
    ];

    /// Reference pixel at the image center instead of the corner.
    pub const CENTER_REFERENCE: [&str; 11] = [
        "UTM", "51", "101", "500050.0", "4499900.0", "2.0", "1.0", "15", "North", "WGS-84",
        "units=Meters",
    ];

    /// Missing pixel sizes.
    pub const TRUNCATED: [&str; 5] = ["UTM", "1", "1", "500000.0", "4500000.0"];

    /// Negative pixel width.
    pub const NEGATIVE_PIXEL: [&str; 7] = ["UTM", "1", "1", "500000.0", "4500000.0", "-1.0", "1.0"];

    /// Non-numeric northing.
    pub const GARBLED_NORTHING: [&str; 7] = ["UTM", "1", "1", "500000.0", "north", "1.0", "1.0"];
}

/// Complete ENVI header text.
pub mod headers {
    /// Header with a rotated map info record spread over two lines.
    pub const ROTATED_HDR: &str = "ENVI
description = {
  AVIRIS-NG reflectance, flight line ang20190716t161530}
samples = 598
lines = 3326
bands = 425
header offset = 0
file type = ENVI Standard
data type = 4
interleave = bil
byte order = 0
map info = { UTM , 1.000 , 1.000 , 791800.000 , 4779500.000 , 5.1000000000e+00 ,
 5.1000000000e+00 , 15 , North , WGS-84 , units=Meters , rotation=75.00000000 }
wavelength units = Nanometers
";

    /// Minimal north-up header.
    pub const NORTH_UP_HDR: &str = "ENVI
samples = 100
lines = 100
map info = {UTM, 1, 1, 500000.0, 4500000.0, 1.0, 1.0, 15, North, WGS-84, units=Meters}
";

    /// Header without georeferencing.
    pub const NO_MAP_INFO_HDR: &str = "ENVI
samples = 10
lines = 10
bands = 1
";
}

/// Common CRS identifiers.
pub mod crs {
    /// WGS84 geographic
    pub const EPSG_4326: &str = "EPSG:4326";

    /// WGS84 / UTM zone 15N
    pub const EPSG_32615: &str = "EPSG:32615";

    /// WGS84 / UTM zone 33S
    pub const EPSG_32733: &str = "EPSG:32733";

    /// Lon/lat order alias
    pub const CRS_84: &str = "CRS:84";
}

/// Geographic points (lon, lat) with known UTM positions.
pub mod points {
    /// Madison, WI in UTM 15N: approximately (792529, 4778066)
    pub const MADISON: (f64, f64) = (-89.40545, 43.09885);

    /// Central meridian of UTM zone 15 on the equator
    pub const ZONE15_EQUATOR: (f64, f64) = (-93.0, 0.0);

    /// Antipode of the zone 15 central meridian
    pub const ZONE15_ANTIPODE: (f64, f64) = (87.0, 0.0);
}

/// Write `contents` to a named temporary file that lives as long as the handle.
pub fn write_temp_file(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new()
        .prefix("geo-pixel-")
        .suffix(suffix)
        .tempfile()
        .expect("failed to create temp file");
    file.write_all(contents.as_bytes())
        .expect("failed to write temp file");
    file
}
