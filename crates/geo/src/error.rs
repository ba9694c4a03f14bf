//! Error types for boundary loading and tiling.

use thiserror::Error;

/// Errors that can occur while building the jurisdiction cell set.
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The boundary text parsed but does not describe a usable polygon
    #[error("Invalid boundary: {0}")]
    InvalidBoundary(String),

    #[error("Coordinate out of range: lat {lat}, lon {lon}")]
    InvalidCoordinate { lat: f64, lon: f64 },

    #[error("Invalid H3 resolution {0} (expected 0..=15)")]
    InvalidResolution(u8),

    #[error("Tiling failed: {0}")]
    Tiling(#[from] h3o::error::InvalidGeometry),
}

/// Result type for boundary operations.
pub type GeoResult<T> = Result<T, GeoError>;
