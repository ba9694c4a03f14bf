//! End-to-end resolution of one telemetry file.

use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use wxresolve_core::PipelineConfig;
use wxresolve_geo::BoundaryRegistry;
use wxresolve_identity::{SchemeTable, SignatureVerifier, VerificationReport, VerificationTally};
use wxresolve_stream::{ChunkFilter, FilterStats, LoadMode, Loader};

use crate::{Decision, DecisionResult, DeviceMeans};

/// Decision for a file together with what each stage kept.
#[derive(Debug, Clone, Serialize)]
pub struct FileResolution {
    pub decision: Decision,
    pub filter: FilterStats,
    /// Absent when attestation is disabled
    pub verification: Option<VerificationReport>,
}

impl FileResolution {
    /// Devices that reached aggregation as a percentage of the devices
    /// reporting from inside the jurisdiction.
    pub fn participation_percent(&self) -> f64 {
        let participating = match &self.verification {
            Some(report) => report.devices_verified,
            None => self.filter.devices_admitted,
        };
        if self.filter.devices_in_jurisdiction == 0 {
            0.0
        } else {
            100.0 * participating as f64 / self.filter.devices_in_jurisdiction as f64
        }
    }
}

/// Loader, verifier and aggregator wired from one configuration.
///
/// Jurisdiction and quality filtering happen inside the loader, per chunk;
/// attestation runs on the filtered records; aggregation runs last.
#[derive(Debug, Clone)]
pub struct Resolver {
    loader: Loader,
    verifier: Option<SignatureVerifier>,
}

impl Resolver {
    pub fn new(registry: Arc<BoundaryRegistry>, config: &PipelineConfig) -> DecisionResult<Self> {
        config.validate()?;
        let filter = ChunkFilter::new(registry, Arc::new(config.quality));
        let verifier = if config.verify_signatures {
            Some(SignatureVerifier::new(SchemeTable::from_config(config)?))
        } else {
            warn!("Signature verification disabled; records are trusted as loaded");
            None
        };
        Ok(Self {
            loader: Loader::new(filter, config.ingest.batch_size),
            verifier,
        })
    }

    /// Build the boundary registry from configuration as well.
    pub fn from_config(config: &PipelineConfig) -> DecisionResult<Self> {
        let registry = BoundaryRegistry::from_config(&config.boundary)?;
        Self::new(Arc::new(registry), config)
    }

    pub fn verifies_signatures(&self) -> bool {
        self.verifier.is_some()
    }

    /// Load, filter and attest a file, then aggregate what survives.
    pub fn decide<P: AsRef<Path>>(
        &self,
        path: P,
        mode: LoadMode,
    ) -> DecisionResult<FileResolution> {
        let loaded = self.loader.load(path.as_ref(), mode)?;
        self.warn_if_model_missing(loaded.has_model);

        let (records, verification) = match &self.verifier {
            Some(verifier) => {
                let (verified, report) = verifier.verify_batch(loaded.records);
                (verified, Some(report))
            }
            None => (loaded.records, None),
        };

        let mut means = DeviceMeans::new();
        means.extend(&records);
        self.finish(means, loaded.stats, verification)
    }

    /// Fold row groups into the aggregator one at a time without holding
    /// the filtered file in memory.
    pub fn decide_streaming<P: AsRef<Path>>(&self, path: P) -> DecisionResult<FileResolution> {
        let path = path.as_ref();
        let mut chunks = self.loader.chunks(path)?;
        self.warn_if_model_missing(chunks.has_model());

        let mut tally = VerificationTally::new();
        let mut means = DeviceMeans::new();
        for chunk in chunks.by_ref() {
            let records = wxresolve_stream::batch_to_records(&chunk?)?;
            let records = match &self.verifier {
                Some(verifier) => verifier.verify_into(records, &mut tally),
                None => records,
            };
            means.extend(&records);
        }

        let stats = chunks.stats();
        stats.log();
        let verification = self.verifier.as_ref().map(|_| tally.report());
        self.finish(means, stats, verification)
    }

    fn warn_if_model_missing(&self, has_model: bool) {
        if !has_model && self.verifier.is_some() {
            warn!("Telemetry has no model column; every record will fail attestation");
        }
    }

    fn finish(
        &self,
        means: DeviceMeans,
        filter: FilterStats,
        verification: Option<VerificationReport>,
    ) -> DecisionResult<FileResolution> {
        let resolution = FileResolution {
            decision: means.decision()?,
            filter,
            verification,
        };
        info!(
            value = resolution.decision.value,
            devices = resolution.decision.devices,
            readings = resolution.decision.readings,
            participation = format_args!("{:.2}%", resolution.participation_percent()),
            "Decision resolved"
        );
        Ok(resolution)
    }
}
