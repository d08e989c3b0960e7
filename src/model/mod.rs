//! Model Module - ensemble scorer and decision policies
//!
//! The scorer is refit per batch/window from an immutable configuration;
//! nothing here holds state across calls.

pub mod forest;
pub mod threshold;
pub mod tree;

// Re-export common types
pub use forest::{
    FittedForest, ForestConfig, IsolationForest, DEFAULT_CONTAMINATION, DEFAULT_N_ESTIMATORS,
};
pub use threshold::{percentile_of, DecisionPolicy, DecisionSet, Label, DEFAULT_PERCENTILE};
