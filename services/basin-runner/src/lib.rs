//! Batch resolution over a Basin namespace.
//!
//! Lists the CIDs a namespace published between two dates, downloads each
//! telemetry file (preferred source first, then the public IPFS gateway),
//! resolves it through the decision pipeline and averages the per-file
//! decisions.

pub mod batch;
pub mod client;
pub mod config;
pub mod error;

pub use batch::{BatchRunner, BatchSummary, FileDecision};
pub use client::{EventIndex, Retriever};
pub use config::{CidSource, RunnerConfig};
pub use error::{RunnerError, RunnerResult};
