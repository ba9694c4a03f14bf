//! Hardware model catalog and its verification schemes.

use std::collections::BTreeMap;

use wxresolve_core::PipelineConfig;

use crate::{IdentityError, IdentityResult, Scheme};

/// Hardware models deployed in the reference fleet.
pub const REFERENCE_CATALOG: [(&str, Scheme); 5] = [
    ("WS1000", Scheme::EcdsaP256Text),
    ("WS1001", Scheme::EcdsaP256Text),
    ("WS2000", Scheme::EcdsaP256Decoded),
    ("WS2001", Scheme::EcdsaP256Decoded),
    ("WG1200", Scheme::RsaPkcs1Sha256),
];

/// Mapping from hardware model code to the scheme its firmware signs with.
///
/// Each model maps to exactly one scheme. Models absent from the table are
/// unsupported hardware.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SchemeTable {
    entries: BTreeMap<String, Scheme>,
}

impl SchemeTable {
    /// An empty table; every model is unsupported.
    pub fn empty() -> Self {
        Self::default()
    }

    /// The reference fleet catalog.
    pub fn reference() -> Self {
        REFERENCE_CATALOG
            .iter()
            .fold(Self::empty(), |table, (model, scheme)| {
                table.with_model(*model, *scheme)
            })
    }

    /// Build the table for a pipeline: the reference catalog with configured
    /// overrides applied, checked for completeness.
    pub fn from_config(config: &PipelineConfig) -> IdentityResult<Self> {
        let table = Self::reference().with_overrides(&config.schemes)?;
        table.validate_catalog(REFERENCE_CATALOG.iter().map(|(model, _)| *model))?;
        Ok(table)
    }

    pub fn with_model(mut self, model: impl Into<String>, scheme: Scheme) -> Self {
        self.insert(model, scheme);
        self
    }

    /// Register or replace the scheme for a model, returning the previous one.
    pub fn insert(&mut self, model: impl Into<String>, scheme: Scheme) -> Option<Scheme> {
        self.entries.insert(model.into(), scheme)
    }

    /// Apply model to scheme-name overrides.
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, String>) -> IdentityResult<Self> {
        for (model, name) in overrides {
            if model.trim().is_empty() {
                return Err(IdentityError::Config(
                    "scheme override with empty model code".to_string(),
                ));
            }
            let scheme: Scheme = name.parse()?;
            if let Some(previous) = self.insert(model.clone(), scheme) {
                if previous != scheme {
                    tracing::info!(
                        model = %model,
                        from = %previous,
                        to = %scheme,
                        "Scheme override applied"
                    );
                }
            }
        }
        Ok(self)
    }

    pub fn scheme_for(&self, model: &str) -> Option<Scheme> {
        self.entries.get(model).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ensure every model in `catalog` has a registered scheme.
    pub fn validate_catalog<'a>(
        &self,
        catalog: impl IntoIterator<Item = &'a str>,
    ) -> IdentityResult<()> {
        let missing: Vec<&str> = catalog
            .into_iter()
            .filter(|model| !self.entries.contains_key(*model))
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(IdentityError::Config(format!(
                "no verification scheme for models: {}",
                missing.join(", ")
            )))
        }
    }
}
