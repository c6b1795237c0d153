//! Index construction from a finalized feature table.
//!
//! Columns are extracted in the declared order, missing values are
//! imputed to 0.0, and every column is standardized independently with
//! statistics computed over the whole table. The statistics are kept so
//! query vectors can be normalized identically later.

use ndarray::Array2;

use cadenza_core::{Error, Result, TrackTable};

use crate::index::{FeatureIndex, ScalerStats, TrackIndex};

impl FeatureIndex {
    /// Build the index from a feature table.
    ///
    /// # Errors
    /// Returns `MissingFeatureColumn` when a named column is absent
    /// from the table, or `EmptyCatalog` when the table has no rows.
    pub fn build(table: &TrackTable, columns: &[String]) -> Result<Self> {
        if table.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        for column in columns {
            if !table.has_column(column) {
                return Err(Error::MissingFeatureColumn {
                    column: column.clone(),
                });
            }
        }

        let n_tracks = table.len();
        let n_features = columns.len();
        log::info!("building feature index: {n_tracks} tracks, {n_features} features");

        // Impute-then-normalize: a missing value becomes 0.0 and then
        // participates in the column statistics like any other.
        let mut matrix = Array2::zeros((n_tracks, n_features));
        for (col, column) in columns.iter().enumerate() {
            for row in 0..n_tracks {
                matrix[[row, col]] = table.value(row, column).unwrap_or(0.0);
            }
        }

        let stats = standardize_columns(&mut matrix);

        let tracks = TrackIndex::from_tracks(table.tracks().cloned().collect());
        Self::from_parts(matrix, tracks, stats, columns.to_vec())
    }
}

/// Standardize each column in place to zero mean and unit variance,
/// returning the statistics used.
///
/// Uses population variance. A zero-variance column keeps scale 1.0 so
/// standardization only centers it.
fn standardize_columns(matrix: &mut Array2<f64>) -> ScalerStats {
    let n = matrix.nrows() as f64;
    let mut mean = Vec::with_capacity(matrix.ncols());
    let mut scale = Vec::with_capacity(matrix.ncols());

    for mut column in matrix.columns_mut() {
        let mu = column.sum() / n;
        let var = column.iter().map(|x| (x - mu).powi(2)).sum::<f64>() / n;
        let sd = var.sqrt();
        let s = if sd > 0.0 { sd } else { 1.0 };
        column.mapv_inplace(|x| (x - mu) / s);
        mean.push(mu);
        scale.push(s);
    }

    ScalerStats { mean, scale }
}
