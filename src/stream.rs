//! Streaming Window Controller
//!
//! State machine over an unbounded arrival stream: buffer records in a
//! fixed-capacity FIFO window, and once the window holds enough samples,
//! re-normalize and re-fit the scorer on every arrival, emitting a decision
//! for the newest record only.
//!
//! The full refit per arrival costs O(window × n_estimators × log window).
//! That is fine at the default 50-sample window but is a known scaling
//! limit; an incrementally-updatable scorer would change the observed
//! behavior and is deliberately not attempted here.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::features::{layout_hash, normalize_lengths, FEATURE_VERSION};
use crate::model::{DecisionPolicy, ForestConfig, IsolationForest, Label};
use crate::record::PacketRecord;

/// Default trailing-window capacity.
pub const DEFAULT_WINDOW_CAPACITY: usize = 50;
/// Default minimum samples before scoring starts (scoring needs > 10).
pub const DEFAULT_MIN_SAMPLES: usize = 11;

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    pub window_capacity: usize,
    pub min_samples_to_score: usize,
    pub forest: ForestConfig,
    pub policy: DecisionPolicy,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            window_capacity: DEFAULT_WINDOW_CAPACITY,
            min_samples_to_score: DEFAULT_MIN_SAMPLES,
            forest: ForestConfig::default(),
            policy: DecisionPolicy::default(),
        }
    }
}

// ============================================================================
// STATE
// ============================================================================

/// Controller phase: buffering arrivals, or scoring every arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowState {
    Filling,
    Scoring,
}

/// Window status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WindowStatus {
    pub state: WindowState,
    pub current_size: usize,
    pub required_size: usize,
    pub capacity: usize,
    pub is_ready: bool,
    pub fill_percent: f32,
    pub arrivals: u64,
    pub decisions: u64,
}

// ============================================================================
// DECISION
// ============================================================================

/// One scored arrival, emitted for the newest record only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamDecision {
    pub timestamp: DateTime<Utc>,
    pub session: String,
    pub feature_version: u8,
    pub layout_hash: u32,
    /// Outermost protocol layer, for the reporting collaborator.
    pub protocol: String,
    pub length: u64,
    /// Normalized length within the window that scored it.
    pub feature: f64,
    pub score: f64,
    pub cutoff: f64,
    pub label: Label,
    pub window_len: usize,
}

// ============================================================================
// WINDOW CONTROLLER
// ============================================================================

/// Owned sliding-window scorer for one streaming session.
///
/// Runs until the upstream arrival source closes; buffered state is never
/// persisted across sessions.
pub struct WindowController {
    config: StreamConfig,
    session_id: String,
    window: VecDeque<PacketRecord>,
    arrivals: u64,
    decisions: u64,
}

impl WindowController {
    pub fn new(mut config: StreamConfig) -> Self {
        if config.window_capacity == 0 {
            log::warn!("[Stream] window_capacity 0 is unusable, using 1");
            config.window_capacity = 1;
        }
        if config.min_samples_to_score == 0 {
            config.min_samples_to_score = 1;
        }
        if config.min_samples_to_score > config.window_capacity {
            log::warn!(
                "[Stream] min_samples_to_score {} exceeds capacity {}, clamped",
                config.min_samples_to_score,
                config.window_capacity
            );
            config.min_samples_to_score = config.window_capacity;
        }

        let session_id = uuid::Uuid::new_v4().to_string();
        log::info!(
            "[Stream {}] session opened (capacity {}, min samples {})",
            &session_id[..8],
            config.window_capacity,
            config.min_samples_to_score
        );

        Self {
            window: VecDeque::with_capacity(config.window_capacity),
            config,
            session_id,
            arrivals: 0,
            decisions: 0,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(StreamConfig::default())
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn state(&self) -> WindowState {
        if self.window.len() >= self.config.min_samples_to_score {
            WindowState::Scoring
        } else {
            WindowState::Filling
        }
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    /// Buffered records, oldest first.
    pub fn window(&self) -> impl Iterator<Item = &PacketRecord> {
        self.window.iter()
    }

    pub fn status(&self) -> WindowStatus {
        let required = self.config.min_samples_to_score;
        let current = self.window.len();
        WindowStatus {
            state: self.state(),
            current_size: current,
            required_size: required,
            capacity: self.config.window_capacity,
            is_ready: current >= required,
            fill_percent: if required > 0 {
                (current as f32 / required as f32 * 100.0).min(100.0)
            } else {
                0.0
            },
            arrivals: self.arrivals,
            decisions: self.decisions,
        }
    }

    /// Accept one arrival: append (evicting the oldest past capacity), and
    /// once the window holds `min_samples_to_score` records, re-score the
    /// whole window and return the newest record's decision. While the
    /// window is still filling, nothing is emitted.
    pub fn push(&mut self, record: PacketRecord) -> Option<StreamDecision> {
        self.arrivals += 1;
        let was_filling = self.window.len() < self.config.min_samples_to_score;

        self.window.push_back(record);
        while self.window.len() > self.config.window_capacity {
            self.window.pop_front();
        }

        let size = self.window.len();
        if size < self.config.min_samples_to_score {
            return None;
        }
        if was_filling {
            log::info!(
                "[Stream {}] window reached {} samples, scoring enabled",
                self.short_id(),
                size
            );
        }

        let lengths: Vec<f64> = self.window.iter().map(|r| r.length as f64).collect();
        let normalized = match normalize_lengths(&lengths) {
            Ok(n) => n,
            Err(e) => {
                log::error!("[Stream {}] normalization failed: {}", self.short_id(), e);
                return None;
            }
        };

        let fitted = match IsolationForest::new(self.config.forest.clone()).fit(&normalized.features)
        {
            Ok(f) => f,
            Err(e) => {
                log::error!("[Stream {}] scorer fit failed: {}", self.short_id(), e);
                return None;
            }
        };

        let scores = fitted.score_samples(&normalized.features);
        let set = self.config.policy.decide(&scores, Some(fitted.offset()));

        let newest = size - 1;
        let record = self.window.back()?;
        let decision = StreamDecision {
            timestamp: record.timestamp,
            session: self.session_id.clone(),
            feature_version: FEATURE_VERSION,
            layout_hash: layout_hash(),
            protocol: record.protocols.outermost().unwrap_or("unknown").to_string(),
            length: record.length,
            feature: normalized.features[newest].length_normalized(),
            score: scores[newest],
            cutoff: set.cutoff,
            label: set.labels[newest],
            window_len: size,
        };

        self.decisions += 1;
        if decision.label.is_anomaly() {
            log::warn!(
                "[Stream {}] anomalous packet: {} {} bytes (score {:.4})",
                self.short_id(),
                decision.protocol,
                decision.length,
                decision.score
            );
        } else {
            log::debug!(
                "[Stream {}] normal packet: {} {} bytes (score {:.4})",
                self.short_id(),
                decision.protocol,
                decision.length,
                decision.score
            );
        }

        Some(decision)
    }

    /// Drain an arrival source, collecting every emitted decision.
    pub fn process_all(
        &mut self,
        records: impl IntoIterator<Item = PacketRecord>,
    ) -> Vec<StreamDecision> {
        records
            .into_iter()
            .filter_map(|record| self.push(record))
            .collect()
    }

    /// Discard the buffered window and counters, as when the arrival source
    /// closes.
    pub fn reset(&mut self) {
        log::info!("[Stream {}] session reset, window discarded", self.short_id());
        self.window.clear();
        self.arrivals = 0;
        self.decisions = 0;
    }

    fn short_id(&self) -> &str {
        &self.session_id[..8]
    }
}

// ============================================================================
// SHARED HANDLE
// ============================================================================

/// Handle for pipelined ingestion: the mutex serializes append+evict with
/// the whole-window re-fit, so a reader only ever observes a wholly
/// pre-arrival or wholly post-arrival window.
#[derive(Clone)]
pub struct SharedWindow {
    inner: Arc<Mutex<WindowController>>,
}

impl SharedWindow {
    pub fn new(config: StreamConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(WindowController::new(config))),
        }
    }

    pub fn push(&self, record: PacketRecord) -> Option<StreamDecision> {
        self.inner.lock().push(record)
    }

    pub fn status(&self) -> WindowStatus {
        self.inner.lock().status()
    }

    pub fn session_id(&self) -> String {
        self.inner.lock().session_id().to_string()
    }

    pub fn reset(&self) {
        self.inner.lock().reset()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(capacity: usize, min_samples: usize) -> StreamConfig {
        StreamConfig {
            window_capacity: capacity,
            min_samples_to_score: min_samples,
            forest: ForestConfig::with_seed(42),
            policy: DecisionPolicy::default(),
        }
    }

    #[test]
    fn test_window_bound_and_arrival_order() {
        let mut controller = WindowController::new(config(5, 3));
        for length in 1..=12 {
            controller.push(PacketRecord::of_length(length));
        }
        let lengths: Vec<u64> = controller.window().map(|r| r.length).collect();
        assert_eq!(lengths, vec![8, 9, 10, 11, 12]);
        assert_eq!(controller.len(), 5);
    }

    #[test]
    fn test_no_decision_while_filling() {
        let mut controller = WindowController::new(config(50, 11));
        for length in 100..110 {
            assert!(controller.push(PacketRecord::of_length(length)).is_none());
            assert_eq!(controller.state(), WindowState::Filling);
        }

        // the 11th arrival flips the state and emits the first decision
        let decision = controller.push(PacketRecord::of_length(110));
        let decision = decision.expect("first decision on the 11th arrival");
        assert_eq!(controller.state(), WindowState::Scoring);
        assert_eq!(decision.window_len, 11);
        assert_eq!(decision.length, 110);
    }

    #[test]
    fn test_decision_is_for_newest_record() {
        let mut controller = WindowController::new(config(50, 11));
        for length in 200..212 {
            if let Some(decision) = controller.push(PacketRecord::of_length(length)) {
                assert_eq!(decision.length, length);
            }
        }
    }

    #[test]
    fn test_scoring_continues_after_eviction() {
        let mut controller = WindowController::new(config(12, 11));
        let mut decisions = 0;
        for length in 0..30 {
            if controller.push(PacketRecord::of_length(300 + length)).is_some() {
                decisions += 1;
            }
        }
        assert_eq!(decisions, 20);
        assert_eq!(controller.len(), 12);
        assert_eq!(controller.status().decisions, 20);
    }

    #[test]
    fn test_length_spike_is_flagged() {
        let mut controller = WindowController::new(config(50, 11));
        for length in 100..130 {
            controller.push(PacketRecord::of_length(length));
        }
        let decision = controller
            .push(PacketRecord::new("10.0.0.9", "10.0.0.1", 5000, "eth:ip:tcp".into()))
            .expect("window is scoring");
        assert!(decision.label.is_anomaly());
        assert_eq!(decision.protocol, "eth");
        assert_eq!(decision.feature, 1.0);
    }

    #[test]
    fn test_all_zero_window_still_decides() {
        let mut controller = WindowController::new(config(50, 11));
        let mut last = None;
        for _ in 0..12 {
            if let Some(decision) = controller.push(PacketRecord::of_length(0)) {
                last = Some(decision);
            }
        }
        let decision = last.expect("decisions once min samples reached");
        assert_eq!(decision.feature, 0.0);
        assert!(!decision.label.is_anomaly());
    }

    #[test]
    fn test_min_samples_clamped_to_capacity() {
        let mut controller = WindowController::new(config(10, 20));
        assert_eq!(controller.status().required_size, 10);
        let mut first_decision_at = None;
        for arrival in 1..=10u64 {
            if controller.push(PacketRecord::of_length(50 + arrival)).is_some() {
                first_decision_at.get_or_insert(arrival);
            }
        }
        assert_eq!(first_decision_at, Some(10));
    }

    #[test]
    fn test_status_progression() {
        let mut controller = WindowController::new(config(50, 11));
        controller.push(PacketRecord::of_length(10));
        controller.push(PacketRecord::of_length(20));

        let status = controller.status();
        assert_eq!(status.state, WindowState::Filling);
        assert_eq!(status.current_size, 2);
        assert_eq!(status.required_size, 11);
        assert!(!status.is_ready);
        assert!((status.fill_percent - 2.0 / 11.0 * 100.0).abs() < 0.01);
        assert_eq!(status.arrivals, 2);
        assert_eq!(status.decisions, 0);
    }

    #[test]
    fn test_reset_discards_window() {
        let mut controller = WindowController::new(config(50, 11));
        for length in 0..15 {
            controller.push(PacketRecord::of_length(400 + length));
        }
        assert_eq!(controller.state(), WindowState::Scoring);

        controller.reset();
        assert!(controller.is_empty());
        assert_eq!(controller.state(), WindowState::Filling);
        assert!(controller.push(PacketRecord::of_length(500)).is_none());
    }

    #[test]
    fn test_process_all_collects_scoring_phase_only() {
        let mut controller = WindowController::new(config(50, 11));
        let records: Vec<PacketRecord> = (0..20).map(|i| PacketRecord::of_length(600 + i)).collect();
        let decisions = controller.process_all(records);
        assert_eq!(decisions.len(), 10);
        assert_eq!(decisions[0].window_len, 11);
    }

    #[test]
    fn test_shared_window_handle() {
        let shared = SharedWindow::new(config(50, 11));
        let other = shared.clone();

        let mut decisions = 0;
        for length in 0..12 {
            let handle = if length % 2 == 0 { &shared } else { &other };
            if handle.push(PacketRecord::of_length(700 + length)).is_some() {
                decisions += 1;
            }
        }
        assert_eq!(decisions, 2);
        assert_eq!(shared.status().current_size, 12);
    }
}
