//! Error types for georeferencing and pixel resolution.

use thiserror::Error;

use crate::crs::CrsParseError;

/// Result type alias using GeorefError.
pub type GeorefResult<T> = Result<T, GeorefError>;

/// Primary error type for pixel resolution.
#[derive(Debug, Error)]
pub enum GeorefError {
    // === Session construction errors ===
    #[error("Malformed metadata field '{field}': {message}")]
    MalformedMetadata { field: String, message: String },

    #[error("Singular transform (determinant {determinant:e}): grid has no inverse")]
    SingularTransform { determinant: f64 },

    // === Per-query errors ===
    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Projection of ({x}, {y}) into {crs} failed: {reason}")]
    ProjectionFailure {
        x: f64,
        y: f64,
        crs: String,
        reason: String,
    },

    #[error("Pixel index ({col}, {row}) does not fit in a 64-bit index")]
    IndexOutOfRange { col: f64, row: f64 },

    // === Boundary errors ===
    #[error("Failed to read metadata: {0}")]
    Io(String),
}

impl GeorefError {
    /// Shorthand for a `MalformedMetadata` error.
    pub fn malformed(field: impl Into<String>, message: impl Into<String>) -> Self {
        GeorefError::MalformedMetadata {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a `ProjectionFailure` error.
    pub fn projection(x: f64, y: f64, crs: impl ToString, reason: impl Into<String>) -> Self {
        GeorefError::ProjectionFailure {
            x,
            y,
            crs: crs.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error invalidates the whole image session.
    ///
    /// Per-query failures (bad CRS, point outside the projection domain)
    /// leave the session usable for other queries.
    pub fn is_session_fatal(&self) -> bool {
        matches!(
            self,
            GeorefError::MalformedMetadata { .. }
                | GeorefError::SingularTransform { .. }
                | GeorefError::Io(_)
        )
    }

    /// Stable machine-readable code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            GeorefError::MalformedMetadata { .. } => "MalformedMetadata",
            GeorefError::SingularTransform { .. } => "SingularTransform",
            GeorefError::UnsupportedCrs(_) => "UnsupportedCRS",
            GeorefError::ProjectionFailure { .. } => "ProjectionFailure",
            GeorefError::IndexOutOfRange { .. } => "IndexOutOfRange",
            GeorefError::Io(_) => "Io",
        }
    }
}

impl From<CrsParseError> for GeorefError {
    fn from(err: CrsParseError) -> Self {
        match err {
            CrsParseError::UnsupportedCrs(code) => GeorefError::UnsupportedCrs(code),
        }
    }
}

// Conversion from common error types
impl From<std::io::Error> for GeorefError {
    fn from(err: std::io::Error) -> Self {
        GeorefError::Io(err.to_string())
    }
}
