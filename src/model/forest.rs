//! Isolation Forest - ensemble anomaly scorer
//!
//! Hand-built ensemble over the fixed feature layout. Scores follow the
//! convention of the reference library the lab's results were calibrated
//! against: `score_samples` lands in [-1, 0), lower = more anomalous, and
//! `fit` learns a cutoff at the contamination percentile of the training
//! scores.
//!
//! Fit-before-score is encoded in the types: `IsolationForest` is only a
//! configuration, scoring lives on `FittedForest`.

use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::features::FeatureVector;

use super::threshold::{percentile_of, Label};
use super::tree::{average_path_length, IsolationTree};

/// Default ensemble size.
pub const DEFAULT_N_ESTIMATORS: usize = 100;
/// Default expected anomaly fraction.
pub const DEFAULT_CONTAMINATION: f64 = 0.05;
/// Per-estimator sub-sample cap from the published algorithm.
const MAX_SUBSAMPLE: usize = 256;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Scorer hyperparameters. Immutable once a fit starts; shared freely across
/// batch runs and streaming sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForestConfig {
    pub n_estimators: usize,
    /// Expected anomaly fraction in (0, 1).
    pub contamination: f64,
    /// Fix for reproducible fits; None draws fresh entropy per fit.
    pub random_seed: Option<u64>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_estimators: DEFAULT_N_ESTIMATORS,
            contamination: DEFAULT_CONTAMINATION,
            random_seed: None,
        }
    }
}

impl ForestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            random_seed: Some(seed),
            ..Self::default()
        }
    }
}

// ============================================================================
// UNFITTED SCORER
// ============================================================================

/// Unfitted scorer: carries configuration only. `fit` hands back the scoring
/// handle, so scoring an unfitted model does not compile.
#[derive(Debug, Clone, Default)]
pub struct IsolationForest {
    config: ForestConfig,
}

impl IsolationForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }

    /// Build the ensemble over the samples and learn the decision offset.
    ///
    /// Each estimator grows over its own sub-sample (without replacement,
    /// capped at 256) with depth capped at ⌈log2(sub-sample)⌉.
    pub fn fit(&self, samples: &[FeatureVector]) -> Result<FittedForest, AnalysisError> {
        if samples.is_empty() {
            return Err(AnalysisError::empty());
        }

        let n = samples.len();
        let n_estimators = self.config.n_estimators.max(1);
        if n_estimators != self.config.n_estimators {
            log::warn!("[Forest] n_estimators 0 is unusable, fitting 1 estimator");
        }

        let contamination = self.config.contamination.clamp(0.0, 1.0);
        if contamination != self.config.contamination {
            log::warn!(
                "[Forest] contamination {} outside (0, 1), clamped to {}",
                self.config.contamination,
                contamination
            );
        }

        let subsample = n.min(MAX_SUBSAMPLE);
        let max_depth = depth_cap(subsample);
        let base_seed = self.config.random_seed.unwrap_or_else(rand::random);

        let mut trees = Vec::with_capacity(n_estimators);
        for estimator in 0..n_estimators {
            // seed_from_u64 runs SplitMix64, so consecutive seeds decorrelate
            let mut rng = StdRng::seed_from_u64(base_seed.wrapping_add(estimator as u64));
            let indices = if subsample == n {
                (0..n).collect()
            } else {
                index::sample(&mut rng, n, subsample).into_vec()
            };
            trees.push(IsolationTree::fit(samples, indices, max_depth, &mut rng));
        }

        let mut fitted = FittedForest {
            trees,
            subsample,
            offset: 0.0,
        };
        let train_scores = fitted.score_samples(samples);
        fitted.offset = percentile_of(&train_scores, contamination * 100.0);

        log::debug!(
            "[Forest] fitted {} estimators over {} samples (cutoff {:.4})",
            n_estimators,
            n,
            fitted.offset
        );
        Ok(fitted)
    }
}

fn depth_cap(subsample: usize) -> usize {
    (subsample.max(2) as f64).log2().ceil() as usize
}

// ============================================================================
// FITTED FOREST
// ============================================================================

/// Fitted ensemble; immutable once built. Refit from scratch for every new
/// batch or window; there is no incremental update.
pub struct FittedForest {
    trees: Vec<IsolationTree>,
    subsample: usize,
    offset: f64,
}

impl FittedForest {
    /// Anomaly score in [-1, 0): lower = more anomalous.
    pub fn score_one(&self, sample: &FeatureVector) -> f64 {
        let mean_path = self
            .trees
            .iter()
            .map(|tree| tree.path_length(sample))
            .sum::<f64>()
            / self.trees.len() as f64;
        let denom = average_path_length(self.subsample).max(f64::EPSILON);
        -(2.0_f64.powf(-mean_path / denom))
    }

    pub fn score_samples(&self, samples: &[FeatureVector]) -> Vec<f64> {
        samples.iter().map(|s| self.score_one(s)).collect()
    }

    /// Learned cutoff: the contamination percentile of the training scores.
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn n_estimators(&self) -> usize {
        self.trees.len()
    }

    pub fn subsample_size(&self) -> usize {
        self.subsample
    }

    /// Native labels: score strictly below the learned cutoff is anomalous.
    pub fn predict(&self, samples: &[FeatureVector]) -> Vec<Label> {
        self.score_samples(samples)
            .iter()
            .map(|&score| {
                if score < self.offset {
                    Label::Anomaly
                } else {
                    Label::Normal
                }
            })
            .collect()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn vectors(values: &[f64]) -> Vec<FeatureVector> {
        values.iter().map(|&v| FeatureVector::from_values([v])).collect()
    }

    #[test]
    fn test_empty_fit_is_an_error() {
        let forest = IsolationForest::new(ForestConfig::with_seed(1));
        assert!(forest.fit(&[]).is_err());
    }

    #[test]
    fn test_fixed_seed_reproduces_scores_exactly() {
        let samples = vectors(&[0.1, 0.4, 0.2, 0.9, 0.3, 0.15, 0.35, 0.25, 0.45, 0.05, 0.5]);
        let forest = IsolationForest::new(ForestConfig::with_seed(1234));

        let first = forest.fit(&samples).unwrap();
        let second = forest.fit(&samples).unwrap();

        assert_eq!(first.score_samples(&samples), second.score_samples(&samples));
        assert_eq!(first.offset(), second.offset());
        assert_eq!(first.predict(&samples), second.predict(&samples));
    }

    #[test]
    fn test_scores_are_negative_and_above_minus_one() {
        let samples = vectors(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8]);
        let fitted = IsolationForest::new(ForestConfig::with_seed(9))
            .fit(&samples)
            .unwrap();
        for score in fitted.score_samples(&samples) {
            assert!(score < 0.0, "score not negative: {}", score);
            assert!(score > -1.0, "score out of range: {}", score);
        }
    }

    #[test]
    fn test_extreme_value_scenario() {
        // normalized [10, 20, 30, 1000] with contamination 0.25: the big
        // packet is the single anomaly
        let samples = vectors(&[0.01, 0.02, 0.03, 1.0]);
        let config = ForestConfig {
            contamination: 0.25,
            ..ForestConfig::with_seed(42)
        };
        let fitted = IsolationForest::new(config).fit(&samples).unwrap();
        let labels = fitted.predict(&samples);

        assert_eq!(labels[3], Label::Anomaly);
        assert_eq!(labels[0], Label::Normal);
        assert_eq!(labels[1], Label::Normal);
        assert_eq!(labels[2], Label::Normal);
    }

    #[test]
    fn test_label_consistency_under_contamination() {
        // 18 clustered samples plus two far outliers, fraction 0.1 over 20
        let mut lengths: Vec<f64> = (0..18).map(|i| 100.0 + i as f64).collect();
        lengths.push(1000.0);
        lengths.push(2000.0);
        let max = 2000.0;
        let samples = vectors(&lengths.iter().map(|l| l / max).collect::<Vec<_>>());

        let config = ForestConfig {
            contamination: 0.1,
            ..ForestConfig::with_seed(7)
        };
        let fitted = IsolationForest::new(config).fit(&samples).unwrap();
        let labels = fitted.predict(&samples);

        let count = labels.iter().filter(|l| l.is_anomaly()).count();
        assert_eq!(count, 2, "expected round(0.1 * 20) anomalies");
        assert_eq!(labels[18], Label::Anomaly);
        assert_eq!(labels[19], Label::Anomaly);
    }

    #[test]
    fn test_constant_data_labels_all_normal() {
        let samples = vectors(&[0.0, 0.0, 0.0]);
        let fitted = IsolationForest::new(ForestConfig::with_seed(5))
            .fit(&samples)
            .unwrap();
        let labels = fitted.predict(&samples);
        assert!(labels.iter().all(|l| !l.is_anomaly()));
    }

    #[test]
    fn test_single_sample_fit() {
        let samples = vectors(&[0.5]);
        let fitted = IsolationForest::new(ForestConfig::with_seed(3))
            .fit(&samples)
            .unwrap();
        let scores = fitted.score_samples(&samples);
        assert_eq!(scores.len(), 1);
        assert!(scores[0].is_finite());
        assert_eq!(fitted.predict(&samples)[0], Label::Normal);
    }

    #[test]
    fn test_zero_estimators_clamped() {
        let samples = vectors(&[0.1, 0.2, 0.3]);
        let config = ForestConfig {
            n_estimators: 0,
            ..ForestConfig::with_seed(2)
        };
        let fitted = IsolationForest::new(config).fit(&samples).unwrap();
        assert_eq!(fitted.n_estimators(), 1);
    }

    #[test]
    fn test_large_input_uses_subsampling() {
        let values: Vec<f64> = (0..300).map(|i| (i % 97) as f64 / 97.0).collect();
        let samples = vectors(&values);
        let fitted = IsolationForest::new(ForestConfig::with_seed(11))
            .fit(&samples)
            .unwrap();
        assert_eq!(fitted.subsample_size(), 256);
        assert_eq!(fitted.score_samples(&samples).len(), 300);
    }
}
