//! Error types for decision resolution.

use thiserror::Error;

use wxresolve_geo::GeoError;
use wxresolve_identity::IdentityError;
use wxresolve_stream::StreamError;

/// Errors that can occur while resolving a decision.
#[derive(Debug, Error)]
pub enum DecisionError {
    /// No device survived the pipeline
    #[error("No qualifying devices to aggregate")]
    EmptyAggregationInput,

    #[error("Ingestion error: {0}")]
    Stream(#[from] StreamError),

    #[error("Boundary error: {0}")]
    Geo(#[from] GeoError),

    #[error("Attestation setup error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Configuration error: {0}")]
    Config(#[from] wxresolve_core::Error),
}

/// Result type for decision operations.
pub type DecisionResult<T> = Result<T, DecisionError>;
