//! Affine grid transforms and coordinate reprojection.
//!
//! Implements Transverse Mercator (UTM) from scratch without external
//! projection libraries. Anything else can be plugged in through the
//! [`Reprojector`] trait.

pub mod affine;
pub mod reproject;
pub mod transverse_mercator;

pub use affine::{AffineCoefficients, AffineTransform};
pub use reproject::{BuiltinReprojector, Reprojector};
pub use transverse_mercator::TransverseMercator;
