//! Traffic Anomaly Lab - Packet Scoring Core
//!
//! Unsupervised anomaly scoring for captured packet metadata: normalize
//! packet lengths into a bounded feature, fit an isolation-forest ensemble
//! over them, and label each sample against a contamination or percentile
//! cutoff. Two modes share that core: whole-file batch runs (preprocess,
//! then score) and a sliding-window streaming session that re-scores on
//! every arrival and emits a decision for the newest packet only.
//!
//! Packet capture, plotting, and CLI concerns belong to collaborator tools.
//! This crate starts at [`PacketRecord`] and ends at labeled output.

pub mod batch;
pub mod dataset;
pub mod error;
pub mod features;
pub mod model;
pub mod record;
pub mod stream;

// Re-export the surface most callers need
pub use batch::{preprocess_capture, score_file, BatchConfig, RunSummary};
pub use error::AnalysisError;
pub use features::{normalize, FeatureVector};
pub use model::{DecisionPolicy, FittedForest, ForestConfig, IsolationForest, Label};
pub use record::{PacketRecord, ProtocolChain};
pub use stream::{SharedWindow, StreamConfig, StreamDecision, WindowController};
