//! Capture CSV writer
//!
//! Writes a table back out with the same quoting rules the reader accepts,
//! so preprocess output can be re-read by the scoring pass unchanged.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dataset::table::TrafficTable;
use crate::error::AnalysisError;

// ============================================================================
// WRITER
// ============================================================================

/// Write a table as CSV, creating parent directories as needed.
pub fn write_table(path: &Path, table: &TrafficTable) -> Result<(), AnalysisError> {
    write_table_inner(path, table).map_err(|e| AnalysisError::io(path, e))?;
    log::debug!(
        "[Dataset] wrote {} rows x {} columns to {}",
        table.n_rows(),
        table.headers().len(),
        path.display()
    );
    Ok(())
}

fn write_table_inner(path: &Path, table: &TrafficTable) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = BufWriter::new(File::create(path)?);
    writeln!(writer, "{}", join_csv(table.headers()))?;
    for row in table.rows() {
        writeln!(writer, "{}", join_csv(row))?;
    }
    writer.flush()
}

pub fn join_csv(fields: &[String]) -> String {
    fields
        .iter()
        .map(|f| escape_field(f))
        .collect::<Vec<_>>()
        .join(",")
}

/// Quote a field when it contains a comma, quote, or newline; literal quotes
/// double inside the quoted form.
pub fn escape_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

// ============================================================================
// TESTS
// ============================================================================
