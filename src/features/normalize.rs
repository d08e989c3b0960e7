//! Feature Normalizer
//!
//! Turns raw packet lengths into bounded, comparable features:
//! `normalized[i] = length[i] / max(lengths)`. Missing or unparseable lengths
//! are imputed with the median of the valid ones before normalization;
//! dropping them instead would shift every later row's index away from its
//! source record.
//!
//! Pure functions over one batch or window; nothing is cached across calls.

use crate::error::AnalysisError;

use super::vector::FeatureVector;
use super::FEATURE_COUNT;

// ============================================================================
// RESULTS
// ============================================================================

/// Outcome of a normalization pass over one batch or window.
#[derive(Debug, Clone)]
pub struct NormalizedFeatures {
    /// One vector per input record, in input order.
    pub features: Vec<FeatureVector>,
    /// Normalization denominator (max over the batch/window).
    pub max_length: f64,
    /// Number of records whose length had to be imputed.
    pub imputed: usize,
    /// All lengths were zero; every feature was set to 0.
    pub degenerate: bool,
}

/// Outcome of imputing an already-normalized feature column.
#[derive(Debug, Clone)]
pub struct ImputedFeatures {
    pub features: Vec<FeatureVector>,
    pub imputed: usize,
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Impute missing lengths, then normalize by the batch max.
pub fn normalize(raw: &[Option<f64>]) -> Result<NormalizedFeatures, AnalysisError> {
    let (lengths, imputed) = impute(raw)?;
    let mut out = normalize_lengths(&lengths)?;
    out.imputed = imputed;
    Ok(out)
}

/// Normalize a sequence of valid lengths by its max.
///
/// `max == 0` is the degenerate all-zero case: every feature becomes 0 and
/// the result is flagged, no division by zero occurs.
pub fn normalize_lengths(lengths: &[f64]) -> Result<NormalizedFeatures, AnalysisError> {
    if lengths.is_empty() {
        return Err(AnalysisError::empty());
    }

    let max_length = lengths.iter().fold(0.0_f64, |acc, &len| acc.max(len));
    let degenerate = max_length <= 0.0;
    if degenerate {
        log::warn!(
            "[Normalizer] all {} lengths are zero, features default to 0",
            lengths.len()
        );
    }

    let features = lengths
        .iter()
        .map(|&len| {
            let mut values = [0.0; FEATURE_COUNT];
            if !degenerate {
                values[0] = len / max_length;
            }
            FeatureVector::from_values(values)
        })
        .collect();

    Ok(NormalizedFeatures {
        features,
        max_length,
        imputed: 0,
        degenerate,
    })
}

/// Impute a feature column that was normalized upstream; values are wrapped
/// as-is, never re-normalized.
pub fn impute_features(raw: &[Option<f64>]) -> Result<ImputedFeatures, AnalysisError> {
    let (values, imputed) = impute(raw)?;
    let features = values
        .into_iter()
        .map(|value| {
            let mut vs = [0.0; FEATURE_COUNT];
            vs[0] = value;
            FeatureVector::from_values(vs)
        })
        .collect();
    Ok(ImputedFeatures { features, imputed })
}

/// Substitute the median of the valid values for every missing one.
///
/// A sequence with no valid value at all has zero usable samples.
fn impute(raw: &[Option<f64>]) -> Result<(Vec<f64>, usize), AnalysisError> {
    if raw.is_empty() {
        return Err(AnalysisError::empty());
    }

    let valid: Vec<f64> = raw.iter().filter_map(|v| *v).collect();
    let median = match median(&valid) {
        Some(m) => m,
        None => return Err(AnalysisError::empty()),
    };

    let mut imputed = 0;
    let values = raw
        .iter()
        .enumerate()
        .map(|(index, value)| match value {
            Some(len) => *len,
            None => {
                imputed += 1;
                log::warn!(
                    "[Normalizer] record {}: unparseable length, imputed median {}",
                    index,
                    median
                );
                median
            }
        })
        .collect();

    Ok((values, imputed))
}

/// Median of the values, averaging the two middle elements for even counts.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

// ============================================================================
// TESTS
// ============================================================================
