//! wxresolve Stream
//!
//! Parquet ingestion for station telemetry. Only the pipeline's columns are
//! projected; in row-group mode each group is narrowed to compact types and
//! passed through the jurisdiction and quality filters before the next one
//! is decoded, so peak memory tracks the largest row group rather than the
//! file.

#![warn(missing_docs)]

pub mod chunks;
pub mod error;
pub mod export;
pub mod filter;
pub mod loader;
pub mod schema;

pub use chunks::FilteredChunks;
pub use error::{StreamError, StreamResult};
pub use export::{batch_to_records, records_to_batch, telemetry_schema, write_parquet};
pub use filter::{ChunkFilter, FilterStats, StatsTracker};
pub use loader::{LoadMode, LoadedTelemetry, Loader};
