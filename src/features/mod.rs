//! Features Module - length feature extraction
//!
//! The versioned layout is the single source of truth for what the scorer
//! consumes; the normalizer is the only place features are derived from raw
//! records.

pub mod layout;
pub mod normalize;
pub mod vector;

#[cfg(test)]
mod tests;

// Re-export common types
pub use layout::{layout_hash, LayoutMismatchError, FEATURE_COUNT, FEATURE_LAYOUT, FEATURE_VERSION};
pub use normalize::{
    impute_features, median, normalize, normalize_lengths, ImputedFeatures, NormalizedFeatures,
};
pub use vector::FeatureVector;
