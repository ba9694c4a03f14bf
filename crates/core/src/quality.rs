//! Quality and provenance admission.
//!
//! Scores are computed upstream by the data provider; the pipeline only
//! consumes them as a pass/fail predicate.

use serde::{Deserialize, Serialize};

/// Minimum quality-of-data score admitted by the reference thresholds.
pub const DEFAULT_MIN_QOD_SCORE: f64 = 0.8;

/// Proof-of-location flag value admitted by the reference thresholds.
pub const DEFAULT_REQUIRED_POL_SCORE: i64 = 1;

/// Pass/fail predicate over quality and provenance scores.
pub trait QualityPredicate: Send + Sync {
    /// Whether a reading with these scores may contribute to a decision.
    fn admits(&self, qod_score: f64, pol_score: i64) -> bool;
}

/// Fixed score thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreThresholds {
    /// Inclusive lower bound on `qod_score`
    pub min_qod_score: f64,
    /// Exact `pol_score` value required
    pub required_pol_score: i64,
}

impl Default for ScoreThresholds {
    fn default() -> Self {
        Self {
            min_qod_score: DEFAULT_MIN_QOD_SCORE,
            required_pol_score: DEFAULT_REQUIRED_POL_SCORE,
        }
    }
}

impl QualityPredicate for ScoreThresholds {
    fn admits(&self, qod_score: f64, pol_score: i64) -> bool {
        // Compared at single precision: low-memory ingestion stores scores as
        // f32, and both load modes must admit the same rows.
        let qod = qod_score as f32;
        !qod.is_nan()
            && qod >= self.min_qod_score as f32
            && pol_score == self.required_pol_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_thresholds() {
        let thresholds = ScoreThresholds::default();
        assert!(thresholds.admits(0.8, 1));
        assert!(thresholds.admits(0.95, 1));
        assert!(!thresholds.admits(0.79, 1));
        assert!(!thresholds.admits(0.9, 0));
        assert!(!thresholds.admits(f64::NAN, 1));
    }

    #[test]
    fn test_narrowed_scores_agree() {
        let thresholds = ScoreThresholds::default();
        for raw in [0.79999999_f64, 0.8, 0.8000001, 0.81, 0.5] {
            let narrowed = raw as f32 as f64;
            assert_eq!(thresholds.admits(raw, 1), thresholds.admits(narrowed, 1));
        }
    }
}
