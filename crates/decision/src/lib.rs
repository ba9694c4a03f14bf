//! Decision resolution for weather-contingent markets.
//!
//! Combines ingestion, jurisdiction and quality filtering, per-model
//! attestation and the two-stage mean into a single scalar per input file:
//! the mean, across qualifying devices, of each device's mean temperature.

pub mod aggregate;
pub mod error;
pub mod pipeline;

pub use aggregate::{resolve, Decision, DeviceMeans};
pub use error::{DecisionError, DecisionResult};
pub use pipeline::{FileResolution, Resolver};
pub use wxresolve_stream::LoadMode;
