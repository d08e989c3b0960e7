//! Batch pipeline operations
//!
//! The two file-level stages of the pipeline: preprocess a raw capture
//! export into a normalized table, then score a normalized table and append
//! the anomaly columns. A batch run has no partial success: the whole file
//! is scored or the run fails before writing anything.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dataset::{read_table, write_table};
use crate::error::AnalysisError;
use crate::features::{impute_features, normalize};
use crate::model::{DecisionPolicy, ForestConfig, IsolationForest};

/// Raw capture column holding the on-wire byte count.
pub const LENGTH_COLUMN: &str = "length";
/// Normalized feature column produced by preprocessing.
pub const FEATURE_COLUMN: &str = "length_normalized";
/// Raw label column: 1 = normal, -1 = anomaly.
pub const ANOMALY_COLUMN: &str = "anomaly";
pub const SCORE_COLUMN: &str = "anomaly_score";
pub const LABEL_COLUMN: &str = "anomaly_label";
/// Seed fixed for reproducible batch runs.
pub const DEFAULT_BATCH_SEED: u64 = 42;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    pub forest: ForestConfig,
    pub policy: DecisionPolicy,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            forest: ForestConfig::with_seed(DEFAULT_BATCH_SEED),
            policy: DecisionPolicy::default(),
        }
    }
}

// ============================================================================
// RUN SUMMARY
// ============================================================================

/// What one batch operation did, logged at info level and returned to the
/// caller.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: String,
    pub input: PathBuf,
    pub output: PathBuf,
    pub rows: usize,
    /// Rows whose feature cell had to be imputed.
    pub imputed: usize,
    /// Preprocess only: every length in the capture was zero.
    pub degenerate: bool,
    /// Scoring only; 0 for a preprocess run.
    pub anomalies: usize,
    /// Score cutoff used for labeling; None for a preprocess run.
    pub cutoff: Option<f64>,
}

// ============================================================================
// PREPROCESS
// ============================================================================

/// Turn a raw capture export into the normalized batch input: parse the
/// `length` column, impute unparseable cells with the median, normalize by
/// the max, and write the table back with `length_normalized` appended.
/// Every other column passes through untouched.
pub fn preprocess_capture(input: &Path, output: &Path) -> Result<RunSummary, AnalysisError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let mut table = read_table(input)?;

    let raw = table
        .numeric_column(LENGTH_COLUMN)
        .ok_or_else(|| AnalysisError::missing_feature(LENGTH_COLUMN, input))?;
    let normalized = normalize(&raw).map_err(|e| e.with_path(input))?;

    let cells = normalized
        .features
        .iter()
        .map(|f| format!("{:.6}", f.length_normalized()))
        .collect();
    table.append_column(FEATURE_COLUMN, cells);
    write_table(output, &table)?;

    let summary = RunSummary {
        run_id,
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        rows: table.n_rows(),
        imputed: normalized.imputed,
        degenerate: normalized.degenerate,
        anomalies: 0,
        cutoff: None,
    };
    log::info!(
        "[Batch {}] preprocessed {} rows (imputed {}, max length {}): {}",
        &summary.run_id[..8],
        summary.rows,
        summary.imputed,
        normalized.max_length,
        output.display()
    );
    Ok(summary)
}

// ============================================================================
// SCORE
// ============================================================================

/// Score a preprocessed table: fit the ensemble over the whole file, then
/// write it back with `anomaly`, `anomaly_score`, and `anomaly_label`
/// columns appended. Row order and count are preserved.
pub fn score_file(
    input: &Path,
    output: &Path,
    config: &BatchConfig,
) -> Result<RunSummary, AnalysisError> {
    let run_id = uuid::Uuid::new_v4().to_string();
    let mut table = read_table(input)?;

    let raw = table
        .numeric_column(FEATURE_COLUMN)
        .ok_or_else(|| AnalysisError::missing_feature(FEATURE_COLUMN, input))?;
    let imputed = impute_features(&raw).map_err(|e| e.with_path(input))?;

    let fitted = IsolationForest::new(config.forest.clone())
        .fit(&imputed.features)
        .map_err(|e| e.with_path(input))?;
    let scores = fitted.score_samples(&imputed.features);
    let set = config.policy.decide(&scores, Some(fitted.offset()));

    table.append_column(
        ANOMALY_COLUMN,
        set.labels.iter().map(|l| l.to_raw().to_string()).collect(),
    );
    table.append_column(
        SCORE_COLUMN,
        scores.iter().map(|s| format!("{:.6}", s)).collect(),
    );
    table.append_column(
        LABEL_COLUMN,
        set.labels.iter().map(|l| l.as_str().to_string()).collect(),
    );
    write_table(output, &table)?;

    let summary = RunSummary {
        run_id,
        input: input.to_path_buf(),
        output: output.to_path_buf(),
        rows: table.n_rows(),
        imputed: imputed.imputed,
        degenerate: false,
        anomalies: set.anomaly_count(),
        cutoff: Some(set.cutoff),
    };
    log::info!(
        "[Batch {}] scored {} rows: {} anomalies (cutoff {:.6}): {}",
        &summary.run_id[..8],
        summary.rows,
        summary.anomalies,
        set.cutoff,
        output.display()
    );
    Ok(summary)
}

// ============================================================================
// TESTS
// ============================================================================
