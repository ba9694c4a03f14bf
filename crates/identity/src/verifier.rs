//! Batch attestation of telemetry records.
//!
//! The verifier is the boundary for per-record failures: an unsupported
//! model, a malformed encoding or a forged signature drops that record and
//! nothing else.

use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use wxresolve_core::DeviceRecord;

use crate::{IdentityError, IdentityResult, SchemeTable};

/// Summary of one verification pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct VerificationReport {
    /// Distinct devices submitted
    pub devices_seen: usize,
    /// Distinct devices with at least one verified record
    pub devices_verified: usize,
    /// Records submitted
    pub records_seen: usize,
    /// Records that passed attestation
    pub records_verified: usize,
    /// Records dropped for an unsupported hardware model
    pub unsupported_records: usize,
    /// Records dropped for a rejected or undecodable signature
    pub rejected_records: usize,
}

/// Running counters across one or more batches.
///
/// Device counts are distinct across every batch fed into the tally, so a
/// device split over several chunks is counted once.
#[derive(Debug, Default)]
pub struct VerificationTally {
    devices_seen: HashSet<String>,
    devices_verified: HashSet<String>,
    records_seen: usize,
    records_verified: usize,
    unsupported_records: usize,
    rejected_records: usize,
}

impl VerificationTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self) -> VerificationReport {
        VerificationReport {
            devices_seen: self.devices_seen.len(),
            devices_verified: self.devices_verified.len(),
            records_seen: self.records_seen,
            records_verified: self.records_verified,
            unsupported_records: self.unsupported_records,
            rejected_records: self.rejected_records,
        }
    }

    fn observe(&mut self, record: &DeviceRecord, outcome: &IdentityResult<()>) {
        self.records_seen += 1;
        if !self.devices_seen.contains(&record.name) {
            self.devices_seen.insert(record.name.clone());
        }
        match outcome {
            Ok(()) => {
                self.records_verified += 1;
                if !self.devices_verified.contains(&record.name) {
                    self.devices_verified.insert(record.name.clone());
                }
            }
            Err(IdentityError::UnsupportedModel { .. }) => self.unsupported_records += 1,
            Err(_) => self.rejected_records += 1,
        }
    }
}

/// Dispatches each record to the scheme registered for its hardware model.
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    table: SchemeTable,
}

impl SignatureVerifier {
    pub fn new(table: SchemeTable) -> Self {
        Self { table }
    }

    /// Attest a single record.
    pub fn verify_record(&self, record: &DeviceRecord) -> IdentityResult<()> {
        let model = record.model_code();
        let scheme = self
            .table
            .scheme_for(model)
            .ok_or_else(|| IdentityError::UnsupportedModel {
                model: model.to_string(),
            })?;
        scheme.check(&record.public_key, &record.packet, &record.signature)
    }

    /// Keep only records that pass attestation.
    pub fn verify_batch(
        &self,
        records: Vec<DeviceRecord>,
    ) -> (Vec<DeviceRecord>, VerificationReport) {
        let mut tally = VerificationTally::new();
        let verified = self.verify_into(records, &mut tally);
        let report = tally.report();
        info!(
            devices_seen = report.devices_seen,
            devices_verified = report.devices_verified,
            records_verified = report.records_verified,
            unsupported_records = report.unsupported_records,
            rejected_records = report.rejected_records,
            "Hardware bundle verification completed"
        );
        (verified, report)
    }

    /// Keep only records that pass attestation, accumulating into `tally`.
    pub fn verify_into(
        &self,
        records: Vec<DeviceRecord>,
        tally: &mut VerificationTally,
    ) -> Vec<DeviceRecord> {
        records
            .into_iter()
            .filter(|record| {
                let outcome = self.verify_record(record);
                match &outcome {
                    Ok(()) => {}
                    Err(IdentityError::UnsupportedModel { model }) => {
                        warn!(
                            device = %record.name,
                            model = %model,
                            "Verification failed - unsupported hardware model"
                        );
                    }
                    Err(err) => {
                        debug!(
                            device = %record.name,
                            model = %record.model_code(),
                            reason = %err,
                            "Signature rejected"
                        );
                    }
                }
                tally.observe(record, &outcome);
                outcome.is_ok()
            })
            .collect()
    }
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new(SchemeTable::reference())
    }
}
