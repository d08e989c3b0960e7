//! Feature Vector - the fixed value type consumed by the scorer
//!
//! Produced exactly once by the normalizer. Downstream components never
//! re-derive features from raw records or look columns up by name past this
//! point.

use serde::{Deserialize, Serialize};

use super::layout::{
    feature_index, layout_hash, validate_layout, LayoutMismatchError, FEATURE_COUNT,
    FEATURE_VERSION,
};

// ============================================================================
// VERSIONED FEATURE VECTOR
// ============================================================================

/// Versioned feature vector with layout metadata.
///
/// Carries its layout version and hash so persisted scores and decision logs
/// can be matched to the schema that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// Feature layout version
    pub version: u8,
    /// CRC32 hash of the feature layout (for mismatch detection)
    pub layout_hash: u32,
    /// Feature values in the order defined by FEATURE_LAYOUT
    pub values: [f64; FEATURE_COUNT],
}

impl FeatureVector {
    /// Zeroed vector with the current version.
    pub fn new() -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values: [0.0; FEATURE_COUNT],
        }
    }

    pub fn from_values(values: [f64; FEATURE_COUNT]) -> Self {
        Self {
            version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            values,
        }
    }

    /// The length feature: packet length / max length over its dataset or
    /// window (layout index 0).
    pub fn length_normalized(&self) -> f64 {
        self.values[0]
    }

    pub fn get(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }

    pub fn get_by_name(&self, name: &str) -> Option<f64> {
        feature_index(name).and_then(|i| self.get(i))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// Validate that this vector is compatible with the current layout.
    pub fn validate(&self) -> Result<(), LayoutMismatchError> {
        validate_layout(self.version, self.layout_hash)
    }

    pub fn is_compatible(&self) -> bool {
        self.validate().is_ok()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::new()
    }
}

impl From<[f64; FEATURE_COUNT]> for FeatureVector {
    fn from(values: [f64; FEATURE_COUNT]) -> Self {
        Self::from_values(values)
    }
}

// ============================================================================
// TESTS
// ============================================================================
