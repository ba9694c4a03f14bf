//! End-to-end tests for the wxresolve pipeline
//!
//! This test suite validates:
//! - Attestation of a mixed-hardware fleet inside the full pipeline
//! - Agreement between whole-file, row-group and streaming ingestion
//! - Telemetry without the optional model column
//! - Scheme overrides taking effect through pipeline configuration

pub mod test_utils;

#[cfg(test)]
mod attestation_tests;

#[cfg(test)]
mod resolution_tests;
