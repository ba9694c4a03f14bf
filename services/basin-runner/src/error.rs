//! Error types for the batch runner.

use thiserror::Error;

use wxresolve_decision::DecisionError;

/// Errors that can occur during a batch run.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// A required environment variable is unset or empty
    #[error("Missing configuration: {0} is not set")]
    MissingConfiguration(&'static str),

    #[error("Invalid configuration for {var}: {reason}")]
    InvalidConfiguration { var: &'static str, reason: String },

    #[error("Malformed date range: {0}")]
    MalformedDateRange(String),

    /// Both the preferred source and the public gateway failed
    #[error("Failed to retrieve {cid}: preferred source: {preferred}; fallback gateway: {fallback}")]
    Retrieval {
        cid: String,
        preferred: String,
        fallback: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Decision error: {0}")]
    Decision(#[from] DecisionError),

    #[error("Configuration error: {0}")]
    Config(#[from] wxresolve_core::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No file in the window produced a decision
    #[error("No file in the event window could be resolved")]
    NoResolvedFiles,
}

/// Result type for runner operations.
pub type RunnerResult<T> = Result<T, RunnerError>;
