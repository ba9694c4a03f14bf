//! Configuration management for wxresolve.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::{Error, Result, ScoreThresholds};

/// Default location of the cached jurisdiction boundary.
pub const DEFAULT_BOUNDARY_PATH: &str = "geojson/boundary_coords.txt";

/// Default H3 resolution used to tile the jurisdiction.
pub const DEFAULT_RESOLUTION: u8 = 7;

/// Finest H3 resolution.
pub const MAX_RESOLUTION: u8 = 15;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub boundary: BoundaryConfig,
    pub quality: ScoreThresholds,
    pub ingest: IngestConfig,
    /// Lean consumers without a model column skip attestation entirely
    pub verify_signatures: bool,
    /// Model code to scheme name overrides, merged over the reference table
    pub schemes: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryConfig {
    pub path: PathBuf,
    pub resolution: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Rows per decoded batch
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            boundary: BoundaryConfig::default(),
            quality: ScoreThresholds::default(),
            ingest: IngestConfig::default(),
            verify_signatures: true,
            schemes: BTreeMap::new(),
        }
    }
}

impl Default for BoundaryConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_BOUNDARY_PATH),
            resolution: DEFAULT_RESOLUTION,
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self { batch_size: 8192 }
    }
}

impl PipelineConfig {
    #[cfg(feature = "toml")]
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values no pipeline stage can honor.
    pub fn validate(&self) -> Result<()> {
        if self.boundary.resolution > MAX_RESOLUTION {
            return Err(Error::Config(format!(
                "boundary.resolution must be <= {}, got {}",
                MAX_RESOLUTION, self.boundary.resolution
            )));
        }
        if self.ingest.batch_size == 0 {
            return Err(Error::Config("ingest.batch_size must be positive".to_string()));
        }
        if !self.quality.min_qod_score.is_finite() {
            return Err(Error::Config(
                "quality.min_qod_score must be finite".to_string(),
            ));
        }
        Ok(())
    }
}
