//! Decision policies - continuous score to {Normal, Anomaly}
//!
//! Two interchangeable policies: the scorer's native contamination boundary,
//! or a percentile cutoff over the observed score distribution. The numeric
//! score is always kept next to the label, never discarded.

use serde::{Deserialize, Serialize};

use super::forest::DEFAULT_CONTAMINATION;

/// Default percentile cutoff (of the score distribution).
pub const DEFAULT_PERCENTILE: f64 = 5.0;

// ============================================================================
// LABEL
// ============================================================================

/// Per-sample verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Normal,
    Anomaly,
}

impl Label {
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Normal => "Normal",
            Label::Anomaly => "Anomaly",
        }
    }

    /// Raw form used in tabular output: 1 = normal, -1 = anomaly.
    pub fn to_raw(&self) -> i8 {
        match self {
            Label::Normal => 1,
            Label::Anomaly => -1,
        }
    }

    pub fn from_raw(raw: i8) -> Self {
        if raw == -1 {
            Label::Anomaly
        } else {
            Label::Normal
        }
    }

    pub fn is_anomaly(&self) -> bool {
        matches!(self, Label::Anomaly)
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// DECISION POLICY
// ============================================================================

/// Score-to-label policy, selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DecisionPolicy {
    /// Bottom `fraction` of scores is anomalous: the scorer's native
    /// boundary. Ties at the cutoff stay Normal.
    Contamination { fraction: f64 },
    /// Scores at or below the p-th percentile are anomalous.
    Percentile { p: f64 },
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        DecisionPolicy::Contamination {
            fraction: DEFAULT_CONTAMINATION,
        }
    }
}

impl DecisionPolicy {
    pub fn contamination(fraction: f64) -> Self {
        DecisionPolicy::Contamination { fraction }
    }

    pub fn percentile(p: f64) -> Self {
        DecisionPolicy::Percentile { p }
    }

    pub fn default_percentile() -> Self {
        DecisionPolicy::Percentile {
            p: DEFAULT_PERCENTILE,
        }
    }

    /// Resolve the cutoff for a score distribution. The contamination policy
    /// prefers the scorer's learned offset when one is available.
    pub fn cutoff(&self, scores: &[f64], native_offset: Option<f64>) -> f64 {
        match self {
            DecisionPolicy::Contamination { fraction } => native_offset
                .unwrap_or_else(|| percentile_of(scores, fraction * 100.0)),
            DecisionPolicy::Percentile { p } => percentile_of(scores, *p),
        }
    }

    fn is_anomalous(&self, score: f64, cutoff: f64) -> bool {
        match self {
            DecisionPolicy::Contamination { .. } => score < cutoff,
            DecisionPolicy::Percentile { .. } => score <= cutoff,
        }
    }

    /// Label every score against the resolved cutoff.
    pub fn decide(&self, scores: &[f64], native_offset: Option<f64>) -> DecisionSet {
        let cutoff = self.cutoff(scores, native_offset);
        let labels = scores
            .iter()
            .map(|&score| {
                if self.is_anomalous(score, cutoff) {
                    Label::Anomaly
                } else {
                    Label::Normal
                }
            })
            .collect();
        DecisionSet { cutoff, labels }
    }
}

/// Labels plus the cutoff that produced them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionSet {
    pub cutoff: f64,
    pub labels: Vec<Label>,
}

impl DecisionSet {
    pub fn anomaly_count(&self) -> usize {
        self.labels.iter().filter(|l| l.is_anomaly()).count()
    }
}

// ============================================================================
// PERCENTILE
// ============================================================================

/// p-th percentile of `values` with linear interpolation between ranks;
/// p is clamped to [0, 100]. NaN for empty input.
pub fn percentile_of(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let p = p.clamp(0.0, 100.0);
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let frac = rank - lo as f64;
    sorted[lo] + frac * (sorted[hi] - sorted[lo])
}

// ============================================================================
// TESTS
// ============================================================================
