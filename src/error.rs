//! Error types for the batch scoring surface.
//!
//! Only fatal conditions live here. Recoverable data problems (unparseable
//! lengths, all-zero windows) are handled inline by the normalizer and logged.

use std::io;
use std::path::{Path, PathBuf};

// ============================================================================
// ANALYSIS ERROR
// ============================================================================

/// Fatal errors raised by batch operations.
///
/// Batch mode has no partial-success concept: either the whole file is scored
/// or none of it is. Streaming mode never raises these; an undersized window
/// simply stays in `Filling`.
#[derive(Debug)]
pub enum AnalysisError {
    /// A required feature column is absent from the input file.
    MissingFeature { column: String, path: PathBuf },
    /// Zero usable samples: an empty table, or no parseable values at all.
    EmptyDataset { path: Option<PathBuf> },
    /// Underlying file I/O failure.
    Io { path: PathBuf, source: io::Error },
}

impl AnalysisError {
    pub fn missing_feature(column: &str, path: &Path) -> Self {
        Self::MissingFeature {
            column: column.to_string(),
            path: path.to_path_buf(),
        }
    }

    /// Empty dataset detected before any file is in play.
    pub fn empty() -> Self {
        Self::EmptyDataset { path: None }
    }

    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Attach the originating file path where it was not known yet.
    pub(crate) fn with_path(self, path: &Path) -> Self {
        match self {
            Self::EmptyDataset { path: None } => Self::EmptyDataset {
                path: Some(path.to_path_buf()),
            },
            other => other,
        }
    }
}

impl std::fmt::Display for AnalysisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingFeature { column, path } => {
                write!(f, "required column '{}' missing from {}", column, path.display())
            }
            Self::EmptyDataset { path: Some(path) } => {
                write!(f, "no usable samples in {}", path.display())
            }
            Self::EmptyDataset { path: None } => write!(f, "no usable samples"),
            Self::Io { path, source } => write!(f, "{}: {}", path.display(), source),
        }
    }
}

impl std::error::Error for AnalysisError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
