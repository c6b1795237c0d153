//! The finalized per-track feature table.
//!
//! A `TrackTable` is the tabular artifact the preprocessing pipeline
//! produces and the index builder consumes: one `Track` per row plus a
//! set of named numeric columns. A missing numeric value is simply an
//! absent entry. Transforms never mutate a table in place; they build
//! and return a new one.

use std::collections::HashMap;

use crate::track::Track;

#[derive(Debug, Clone, Default)]
pub struct TrackTable {
    columns: Vec<String>,
    tracks: Vec<Track>,
    values: Vec<HashMap<String, f64>>,
}

impl TrackTable {
    /// Create an empty table with the given numeric column schema.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            tracks: Vec::new(),
            values: Vec::new(),
        }
    }

    /// Append a row. Value keys outside the declared column schema are
    /// kept but invisible to schema-driven readers.
    pub fn push_row(&mut self, track: Track, values: HashMap<String, f64>) {
        self.tracks.push(track);
        self.values.push(values);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The declared numeric columns, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|c| c == column)
    }

    #[must_use]
    pub fn track(&self, row: usize) -> &Track {
        &self.tracks[row]
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    /// The numeric value at (row, column), or `None` when missing.
    #[must_use]
    pub fn value(&self, row: usize, column: &str) -> Option<f64> {
        self.values.get(row).and_then(|v| v.get(column)).copied()
    }

    /// All values stored for one row.
    #[must_use]
    pub fn row_values(&self, row: usize) -> &HashMap<String, f64> {
        &self.values[row]
    }

    /// Present (non-missing) values of one column, in row order.
    #[must_use]
    pub fn column_values(&self, column: &str) -> Vec<f64> {
        (0..self.len())
            .filter_map(|row| self.value(row, column))
            .collect()
    }
}
