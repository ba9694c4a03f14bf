//! Core functionality for the wxresolve market-resolution pipeline.
//!
//! This crate provides the record model, the quality predicate, configuration
//! and logging shared by every stage of the pipeline: ingestion, geographic
//! filtering, signature attestation and aggregation.

pub mod config;
pub mod error;
pub mod logging;
pub mod quality;
pub mod record;

pub use config::{BoundaryConfig, IngestConfig, PipelineConfig};
pub use error::{Error, Result};
pub use quality::{QualityPredicate, ScoreThresholds};
pub use record::{columns, DeviceRecord};
