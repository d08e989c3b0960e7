//! Decision log
//!
//! Append-only JSONL sink for streaming decisions. Thread-safe and flushed
//! per record so a crash never loses more than the in-flight line.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::AnalysisError;
use crate::stream::StreamDecision;

// ============================================================================
// DECISION LOG
// ============================================================================

/// Append-only JSONL decision writer.
pub struct DecisionLog {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
}

impl DecisionLog {
    /// Open (or create) a decision log for appending.
    pub fn open(path: &Path) -> Result<Self, AnalysisError> {
        let file = open_append(path).map_err(|e| AnalysisError::io(path, e))?;
        log::info!("[Dataset] decision log open: {}", path.display());
        Ok(Self {
            writer: Mutex::new(BufWriter::new(file)),
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one decision as a JSON line.
    pub fn append(&self, decision: &StreamDecision) -> Result<(), AnalysisError> {
        self.append_inner(decision)
            .map_err(|e| AnalysisError::io(&self.path, e))
    }

    fn append_inner(&self, decision: &StreamDecision) -> std::io::Result<()> {
        let line = serde_json::to_string(decision)?;
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        // Flush for durability
        writer.flush()
    }
}

fn open_append(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

// ============================================================================
// QUERY API
// ============================================================================

/// Read all decisions back from a log file. Unparseable lines are skipped
/// with a warning rather than aborting the read.
pub fn read_decisions(path: &Path) -> Result<Vec<StreamDecision>, AnalysisError> {
    read_decisions_inner(path).map_err(|e| AnalysisError::io(path, e))
}

fn read_decisions_inner(path: &Path) -> std::io::Result<Vec<StreamDecision>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut decisions = Vec::new();
    let mut skipped = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str::<StreamDecision>(&line) {
            Ok(decision) => decisions.push(decision),
            Err(_) => skipped += 1,
        }
    }

    if skipped > 0 {
        log::warn!(
            "[Dataset] skipped {} unparseable lines in {}",
            skipped,
            path.display()
        );
    }
    Ok(decisions)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ForestConfig;
    use crate::record::PacketRecord;
    use crate::stream::{StreamConfig, WindowController};
    use tempfile::TempDir;

    fn sample_decisions(n: usize) -> Vec<StreamDecision> {
        let mut controller = WindowController::new(StreamConfig {
            window_capacity: 50,
            min_samples_to_score: 11,
            forest: ForestConfig::with_seed(42),
            ..StreamConfig::default()
        });
        let records = (0..(10 + n) as u64).map(|i| PacketRecord::of_length(100 + i));
        controller.process_all(records)
    }

    #[test]
    fn test_append_and_read_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("decisions.jsonl");

        let decisions = sample_decisions(3);
        let log = DecisionLog::open(&path).unwrap();
        for decision in &decisions {
            log.append(decision).unwrap();
        }

        let read_back = read_decisions(&path).unwrap();
        assert_eq!(read_back.len(), 3);
        assert_eq!(read_back[0].session, decisions[0].session);
        assert_eq!(read_back[2].length, decisions[2].length);
    }

    #[test]
    fn test_garbage_line_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("decisions.jsonl");

        let decisions = sample_decisions(2);
        let log = DecisionLog::open(&path).unwrap();
        log.append(&decisions[0]).unwrap();
        {
            use std::io::Write;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "not json at all").unwrap();
        }
        log.append(&decisions[1]).unwrap();

        let read_back = read_decisions(&path).unwrap();
        assert_eq!(read_back.len(), 2);
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("logs").join("nested").join("d.jsonl");

        let log = DecisionLog::open(&path).unwrap();
        let decisions = sample_decisions(1);
        log.append(&decisions[0]).unwrap();

        assert!(path.exists());
        assert_eq!(read_decisions(&path).unwrap().len(), 1);
    }

    #[test]
    fn test_read_missing_log_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.jsonl");

        let err = read_decisions(&path).unwrap_err();
        assert!(err.to_string().contains("absent.jsonl"));
    }
}
