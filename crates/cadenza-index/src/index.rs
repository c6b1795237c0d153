use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use cadenza_core::{Error, Result, Track};

/// Per-column standardization statistics captured at build time.
///
/// Persisted with the index so a freshly constructed query vector can
/// be normalized exactly as the stored matrix was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerStats {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl ScalerStats {
    #[must_use]
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Standardize a raw vector with the captured statistics.
    ///
    /// The vector must be laid out in the index's feature-column order.
    #[must_use]
    pub fn standardize(&self, raw: &Array1<f64>) -> Array1<f64> {
        debug_assert_eq!(raw.len(), self.len());
        let values = raw
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .map(|(x, (mean, scale))| (x - mean) / scale)
            .collect();
        Array1::from_vec(values)
    }
}

/// Bidirectional id ↔ row mapping with per-row display metadata.
///
/// Row indices are stable for the lifetime of one loaded index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackIndex {
    id_to_row: HashMap<String, usize>,
    rows: Vec<Track>,
}

impl TrackIndex {
    /// Build the mapping from tracks in row order.
    #[must_use]
    pub fn from_tracks(rows: Vec<Track>) -> Self {
        let id_to_row = rows
            .iter()
            .enumerate()
            .map(|(row, track)| (track.id.clone(), row))
            .collect();
        Self { id_to_row, rows }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn row_of(&self, id: &str) -> Option<usize> {
        self.id_to_row.get(id).copied()
    }

    #[must_use]
    pub fn id_at(&self, row: usize) -> Option<&str> {
        self.rows.get(row).map(|t| t.id.as_str())
    }

    #[must_use]
    pub fn track_at(&self, row: usize) -> Option<&Track> {
        self.rows.get(row)
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.rows.iter()
    }

    /// Check internal coherence of the two persisted directions.
    ///
    /// # Errors
    /// Returns `CorruptIndex` when the id→row map and the row list
    /// disagree.
    pub fn validate(&self) -> Result<()> {
        if self.id_to_row.len() != self.rows.len() {
            return Err(Error::CorruptIndex(format!(
                "track index maps {} ids over {} rows",
                self.id_to_row.len(),
                self.rows.len()
            )));
        }
        for (id, &row) in &self.id_to_row {
            match self.rows.get(row) {
                Some(track) if track.id == *id => {}
                _ => {
                    return Err(Error::CorruptIndex(format!(
                        "track index entry '{id}' does not round-trip through row {row}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The feature index: standardized matrix, lookups, and statistics.
///
/// Read-only once built. The matrix holds post-normalization,
/// pre-weight values; weighting happens in the similarity layer.
#[derive(Debug, Clone)]
pub struct FeatureIndex {
    matrix: Array2<f64>,
    tracks: TrackIndex,
    stats: ScalerStats,
    columns: Vec<String>,
}

impl FeatureIndex {
    /// Assemble an index from its parts, validating consistency.
    ///
    /// # Errors
    /// Returns `CorruptIndex` when the parts disagree on row or column
    /// counts.
    pub fn from_parts(
        matrix: Array2<f64>,
        tracks: TrackIndex,
        stats: ScalerStats,
        columns: Vec<String>,
    ) -> Result<Self> {
        if matrix.nrows() != tracks.len() {
            return Err(Error::CorruptIndex(format!(
                "matrix has {} rows but track index has {} entries",
                matrix.nrows(),
                tracks.len()
            )));
        }
        if stats.len() != columns.len() || matrix.ncols() != columns.len() {
            return Err(Error::CorruptIndex(format!(
                "{} feature columns, {} matrix columns, {} scaler entries",
                columns.len(),
                matrix.ncols(),
                stats.len()
            )));
        }
        tracks.validate()?;
        Ok(Self {
            matrix,
            tracks,
            stats,
            columns,
        })
    }

    #[must_use]
    pub fn matrix(&self) -> &Array2<f64> {
        &self.matrix
    }

    #[must_use]
    pub fn tracks(&self) -> &TrackIndex {
        &self.tracks
    }

    #[must_use]
    pub fn stats(&self) -> &ScalerStats {
        &self.stats
    }

    /// The authoritative feature-column order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn n_tracks(&self) -> usize {
        self.matrix.nrows()
    }

    #[must_use]
    pub fn n_features(&self) -> usize {
        self.matrix.ncols()
    }

    /// Decompose into parts, for consumers that re-shape the matrix.
    #[must_use]
    pub fn into_parts(self) -> (Array2<f64>, TrackIndex, ScalerStats, Vec<String>) {
        (self.matrix, self.tracks, self.stats, self.columns)
    }
}
