//! Error types for wxresolve ingestion.
//!
//! Errors here are per-file: a missing column or an unreadable file aborts
//! that file's load and nothing else.

use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Errors that can occur while loading telemetry.
#[derive(Debug, Error)]
pub enum StreamError {
    /// A required column is absent from the file schema
    #[error("Missing required column: {column}")]
    MissingColumn {
        /// Column name
        column: String,
    },

    /// A column could not be read as the type the pipeline needs
    #[error("Column {column} has unsupported type {data_type}")]
    UnsupportedColumnType {
        /// Column name
        column: String,
        /// Arrow type found in the file
        data_type: String,
    },

    /// Parquet decoding errors
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Arrow kernel errors (cast, filter, concat)
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for ingestion operations.
pub type StreamResult<T> = Result<T, StreamError>;
