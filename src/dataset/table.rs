//! In-memory capture table
//!
//! Header-addressed string cells, as read from a capture CSV. Cells stay
//! strings until a consumer asks for a numeric view, so pass-through columns
//! (addresses, protocol chains) survive a preprocess round trip untouched.

// ============================================================================
// TABLE
// ============================================================================

/// One capture file's worth of rows, column-addressable by header name.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl TrafficTable {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Append a row, padding or truncating to the header width so every
    /// stored row stays rectangular.
    pub fn push_row(&mut self, mut row: Vec<String>) {
        if row.len() != self.headers.len() {
            log::debug!(
                "[Dataset] row {} has {} cells, expected {}",
                self.rows.len(),
                row.len(),
                self.headers.len()
            );
            row.resize(self.headers.len(), String::new());
        }
        self.rows.push(row);
    }

    /// Numeric view of a column, one slot per row. Cells that fail to parse,
    /// are non-finite, or are negative come back as `None` so the caller can
    /// impute them instead of poisoning downstream scaling.
    pub fn numeric_column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let index = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| {
                    row.get(index)
                        .and_then(|cell| cell.trim().parse::<f64>().ok())
                        .filter(|v| v.is_finite() && *v >= 0.0)
                })
                .collect(),
        )
    }

    /// Append a derived column. `values` is positional, one per row; a short
    /// vector pads with empty cells.
    pub fn append_column(&mut self, name: impl Into<String>, values: Vec<String>) {
        let name = name.into();
        if values.len() != self.rows.len() {
            log::warn!(
                "[Dataset] column '{}' has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            );
        }
        self.headers.push(name);
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or_default());
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
