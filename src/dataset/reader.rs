//! Capture CSV reader
//!
//! Line-oriented parser for the capture exports this crate scores: header
//! row first, quote-aware field splitting, CRLF tolerated, blank lines
//! skipped. Failures carry the offending file path.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::dataset::table::TrafficTable;
use crate::error::AnalysisError;

// ============================================================================
// READER
// ============================================================================

/// Read a capture CSV into a table. The first non-blank line is the header;
/// a file without one is an empty dataset.
pub fn read_table(path: &Path) -> Result<TrafficTable, AnalysisError> {
    let file = File::open(path).map_err(|e| AnalysisError::io(path, e))?;
    let mut lines = BufReader::new(file).lines();

    let headers = loop {
        match lines.next() {
            Some(line) => {
                let line = line.map_err(|e| AnalysisError::io(path, e))?;
                let line = line.trim_end_matches('\r');
                if line.trim().is_empty() {
                    continue;
                }
                break split_csv_line(line);
            }
            None => return Err(AnalysisError::empty().with_path(path)),
        }
    };

    let mut table = TrafficTable::new(headers);
    for line in lines {
        let line = line.map_err(|e| AnalysisError::io(path, e))?;
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        table.push_row(split_csv_line(line));
    }

    log::debug!(
        "[Dataset] read {} rows x {} columns from {}",
        table.n_rows(),
        table.headers().len(),
        path.display()
    );
    Ok(table)
}

/// Split one CSV line into fields. Quoted fields may contain commas and
/// doubled quotes (`""` for a literal quote).
pub fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

// ============================================================================
// TESTS
// ============================================================================
