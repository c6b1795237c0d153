//! Index persistence.
//!
//! Three co-located artifacts form one index generation and are only
//! meaningful as a set: the raw matrix (bincode), the track index
//! (JSON), and the build configuration with scaler statistics (JSON).
//! Loading cross-validates all three; any disagreement is a
//! `CorruptIndex` with no partial repair.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use cadenza_core::{Error, Result};

use crate::index::{FeatureIndex, ScalerStats, TrackIndex};

const MATRIX_FILE: &str = "feature_matrix.bin";
const TRACK_INDEX_FILE: &str = "track_index.json";
const CONFIG_FILE: &str = "index_config.json";

/// Raw matrix artifact: post-normalization, pre-weight values.
#[derive(Debug, Serialize, Deserialize)]
struct MatrixData {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

/// Build configuration artifact.
#[derive(Debug, Serialize, Deserialize)]
struct IndexConfig {
    feature_columns: Vec<String>,
    n_tracks: usize,
    n_features: usize,
    scaler_mean: Vec<f64>,
    scaler_scale: Vec<f64>,
}

impl FeatureIndex {
    /// Write the three index artifacts into `dir`.
    ///
    /// # Errors
    /// Returns an error when a file cannot be created or encoded.
    pub fn save(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let matrix_data = MatrixData {
            rows: self.n_tracks(),
            cols: self.n_features(),
            data: self.matrix().iter().copied().collect(),
        };
        let writer = BufWriter::new(File::create(dir.join(MATRIX_FILE))?);
        bincode::serialize_into(writer, &matrix_data)
            .map_err(|e| Error::Encoding(format!("serializing feature matrix: {e}")))?;

        let writer = BufWriter::new(File::create(dir.join(TRACK_INDEX_FILE))?);
        serde_json::to_writer_pretty(writer, self.tracks())?;

        let config = IndexConfig {
            feature_columns: self.columns().to_vec(),
            n_tracks: self.n_tracks(),
            n_features: self.n_features(),
            scaler_mean: self.stats().mean.clone(),
            scaler_scale: self.stats().scale.clone(),
        };
        let writer = BufWriter::new(File::create(dir.join(CONFIG_FILE))?);
        serde_json::to_writer_pretty(writer, &config)?;

        log::info!(
            "saved index ({} tracks, {} features) to {}",
            self.n_tracks(),
            self.n_features(),
            dir.display()
        );
        Ok(())
    }

    /// Load and cross-validate the three index artifacts from `dir`.
    ///
    /// # Errors
    /// Returns `CorruptIndex` when the artifacts are mutually
    /// inconsistent, or an I/O / deserialization error when an artifact
    /// is unreadable.
    pub fn load(dir: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(dir.join(MATRIX_FILE))?);
        let matrix_data: MatrixData = bincode::deserialize_from(reader)
            .map_err(|e| Error::CorruptIndex(format!("matrix artifact unreadable: {e}")))?;

        if matrix_data.data.len() != matrix_data.rows * matrix_data.cols {
            return Err(Error::CorruptIndex(format!(
                "matrix artifact claims {}x{} but holds {} values",
                matrix_data.rows,
                matrix_data.cols,
                matrix_data.data.len()
            )));
        }

        let reader = BufReader::new(File::open(dir.join(TRACK_INDEX_FILE))?);
        let tracks: TrackIndex = serde_json::from_reader(reader)?;

        let reader = BufReader::new(File::open(dir.join(CONFIG_FILE))?);
        let config: IndexConfig = serde_json::from_reader(reader)?;

        if config.n_tracks != matrix_data.rows || config.n_features != matrix_data.cols {
            return Err(Error::CorruptIndex(format!(
                "config records {}x{} but matrix artifact is {}x{}",
                config.n_tracks, config.n_features, matrix_data.rows, matrix_data.cols
            )));
        }
        if config.feature_columns.len() != config.n_features {
            return Err(Error::CorruptIndex(format!(
                "config names {} feature columns for {} features",
                config.feature_columns.len(),
                config.n_features
            )));
        }
        if config.scaler_mean.len() != config.feature_columns.len()
            || config.scaler_scale.len() != config.feature_columns.len()
        {
            return Err(Error::CorruptIndex(
                "scaler statistics length disagrees with feature-column count".to_string(),
            ));
        }

        let matrix =
            Array2::from_shape_vec((matrix_data.rows, matrix_data.cols), matrix_data.data)
                .map_err(|e| Error::CorruptIndex(format!("matrix shape invalid: {e}")))?;
        let stats = ScalerStats {
            mean: config.scaler_mean,
            scale: config.scaler_scale,
        };

        // from_parts re-checks matrix rows against the track index and
        // validates the id map round-trips.
        let index = Self::from_parts(matrix, tracks, stats, config.feature_columns)?;
        log::info!(
            "loaded index ({} tracks, {} features) from {}",
            index.n_tracks(),
            index.n_features(),
            dir.display()
        );
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadenza_core::{Track, TrackTable};
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn build_sample() -> FeatureIndex {
        let columns = vec!["energy".to_string(), "tempo".to_string()];
        let mut table = TrackTable::new(columns.clone());
        let rows: [(&str, f64, f64); 3] = [("a", 0.9, 120.0), ("b", 0.1, 80.0), ("c", 0.5, 100.0)];
        for (id, energy, tempo) in rows {
            table.push_row(
                Track::new(id, id.to_uppercase()).with_popularity(50),
                HashMap::from([
                    ("energy".to_string(), energy),
                    ("tempo".to_string(), tempo),
                ]),
            );
        }
        FeatureIndex::build(&table, &columns).unwrap()
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let index = build_sample();
        index.save(dir.path()).unwrap();

        let loaded = FeatureIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.n_tracks(), index.n_tracks());
        assert_eq!(loaded.columns(), index.columns());
        assert_eq!(loaded.stats(), index.stats());
        assert_eq!(loaded.matrix(), index.matrix());
        assert_eq!(loaded.tracks().row_of("b"), index.tracks().row_of("b"));
    }

    #[test]
    fn test_load_detects_truncated_track_index() {
        let dir = TempDir::new().unwrap();
        build_sample().save(dir.path()).unwrap();

        // Rewrite the track index with one row missing.
        let shorter = TrackIndex::from_tracks(vec![
            Track::new("a", "A"),
            Track::new("b", "B"),
        ]);
        let writer = BufWriter::new(File::create(dir.path().join(TRACK_INDEX_FILE)).unwrap());
        serde_json::to_writer(writer, &shorter).unwrap();

        let err = FeatureIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)), "got {err}");
    }

    #[test]
    fn test_load_detects_stats_length_mismatch() {
        let dir = TempDir::new().unwrap();
        build_sample().save(dir.path()).unwrap();

        let config = IndexConfig {
            feature_columns: vec!["energy".to_string(), "tempo".to_string()],
            n_tracks: 3,
            n_features: 2,
            scaler_mean: vec![0.0],
            scaler_scale: vec![1.0],
        };
        let writer = BufWriter::new(File::create(dir.path().join(CONFIG_FILE)).unwrap());
        serde_json::to_writer(writer, &config).unwrap();

        let err = FeatureIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)), "got {err}");
    }

    #[test]
    fn test_load_detects_garbled_matrix() {
        let dir = TempDir::new().unwrap();
        build_sample().save(dir.path()).unwrap();

        std::fs::write(dir.path().join(MATRIX_FILE), b"not a matrix").unwrap();
        let err = FeatureIndex::load(dir.path()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)), "got {err}");
    }
}
