//! Common types shared by the geo-pixel crates.

pub mod crs;
pub mod error;
pub mod grid;
pub mod point;

pub use crs::{Crs, CrsCode, CrsKind, Ellipsoid};
pub use error::{GeorefError, GeorefResult};
pub use grid::GridTransform;
pub use point::{round_half_up, PixelIndex, Point2D};
