//! Error types for attestation operations.

use thiserror::Error;

/// Errors that can occur while attesting a record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
    /// No verification scheme is registered for the hardware model
    #[error("Unsupported hardware model: {model:?}")]
    UnsupportedModel { model: String },

    /// The signature check ran and rejected the signature
    #[error("Signature verification failed")]
    SignatureInvalid,

    /// Malformed key, payload or signature encoding
    #[error("Decode error in {field}: {reason}")]
    Decode { field: &'static str, reason: String },

    /// Invalid scheme table configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl IdentityError {
    pub(crate) fn decode(field: &'static str, reason: impl ToString) -> Self {
        Self::Decode {
            field,
            reason: reason.to_string(),
        }
    }
}

/// Result type for attestation operations.
pub type IdentityResult<T> = Result<T, IdentityError>;
