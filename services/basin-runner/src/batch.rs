//! Resolve every file published in the event window and average the results.

use serde::Serialize;
use tracing::{info, warn};

use wxresolve_decision::{LoadMode, Resolver};

use crate::{EventIndex, Retriever, RunnerConfig, RunnerError, RunnerResult};

/// Per-file decision for one CID.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileDecision {
    pub cid: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Unweighted mean of the per-file decisions
    pub average: f64,
    pub decisions: Vec<FileDecision>,
    pub failed: Vec<String>,
}

pub struct BatchRunner {
    index: EventIndex,
    retriever: Retriever,
    resolver: Resolver,
    mode: LoadMode,
    window: (i64, i64),
}

impl BatchRunner {
    pub fn new(config: &RunnerConfig) -> RunnerResult<Self> {
        let resolver = Resolver::from_config(&config.pipeline)?;
        Ok(Self {
            index: EventIndex::new(config)?,
            retriever: Retriever::new(config)?,
            resolver,
            mode: LoadMode::from_lowmem(config.lowmem),
            window: (config.after, config.before),
        })
    }

    /// List the window, then resolve each CID in turn.
    ///
    /// A file that cannot be downloaded or resolved is logged and skipped;
    /// the run fails only when no file produced a decision.
    pub fn run(&self) -> RunnerResult<BatchSummary> {
        let (after, before) = self.window;
        let cids = self.index.fetch_cids(after, before)?;
        self.resolve_all(cids)
    }

    pub fn resolve_all(&self, cids: Vec<String>) -> RunnerResult<BatchSummary> {
        let mut decisions = Vec::new();
        let mut failed = Vec::new();

        for cid in cids {
            match self.resolve_one(&cid) {
                Ok(value) if value.is_finite() => {
                    info!(cid = %cid, value, "File resolved");
                    decisions.push(FileDecision { cid, value });
                }
                Ok(value) => {
                    warn!(cid = %cid, value, "Non-finite decision discarded");
                    failed.push(cid);
                }
                Err(e) => {
                    warn!(cid = %cid, error = %e, "File skipped");
                    failed.push(cid);
                }
            }
        }

        if decisions.is_empty() {
            return Err(RunnerError::NoResolvedFiles);
        }
        let average =
            decisions.iter().map(|d| d.value).sum::<f64>() / decisions.len() as f64;
        info!(
            resolved = decisions.len(),
            failed = failed.len(),
            average,
            "Batch complete"
        );
        Ok(BatchSummary {
            average,
            decisions,
            failed,
        })
    }

    fn resolve_one(&self, cid: &str) -> RunnerResult<f64> {
        let file = self.retriever.fetch(cid)?;
        let resolution = self.resolver.decide(file.path(), self.mode)?;
        Ok(resolution.decision.value)
    }
}
