//! Georeferencing metadata parsing.
//!
//! Turns the loosely-typed "map info" record found in ENVI headers (or the
//! equivalent attribute of a dataset) into a validated [`GridTransform`].
//! All string handling for georeferencing lives in this crate.
//!
//! The easting/northing in the record belong to the reference pixel given in
//! fields [1]/[2], which need not be (1, 1). [`parse_grid_transform`] moves
//! that point back along the rotated pixel axes to the outer corner of pixel
//! (1, 1), so `origin_x`/`origin_y` of the result differ from fields [3]/[4]
//! whenever the reference pixel is anywhere else.
//!
//! [`GridTransform`]: georef_common::GridTransform

pub mod header;
pub mod metadata;
pub mod record;

pub use metadata::{MetadataValue, RawMetadata};
pub use record::{Hemisphere, MapInfo};

use georef_common::{GeorefResult, GridTransform};

/// Parse the grid transform out of a metadata mapping.
pub fn parse_grid_transform(metadata: &RawMetadata) -> GeorefResult<GridTransform> {
    MapInfo::from_metadata(metadata)?.grid_transform()
}
