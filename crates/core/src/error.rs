//! Core error types

use thiserror::Error;

/// Core error type for wxresolve
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error
    #[cfg(feature = "toml")]
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;
