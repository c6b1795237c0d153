//! Weighted cosine similarity over the catalog matrix.
//!
//! Weighting happens after standardization: features first contribute
//! on a comparable scale, then the declared importance multiplies in.
//! Callers weight the full catalog matrix once at load time and every
//! query vector with the same table, so corpus and query stay
//! consistent.

use ndarray::{Array1, Array2, ArrayView1};
use std::cmp::Ordering;
use std::collections::HashSet;

use cadenza_core::FeatureWeights;

/// Score assigned to excluded rows. Below any real cosine similarity,
/// so excluded rows sort last.
pub const EXCLUDED_SCORE: f64 = -1.0;

/// Multiply each matrix column by its configured weight.
///
/// `names` must match the matrix columns in order. Pure: returns a new
/// matrix.
#[must_use]
pub fn apply_weights(
    matrix: &Array2<f64>,
    names: &[String],
    weights: &FeatureWeights,
) -> Array2<f64> {
    debug_assert_eq!(matrix.ncols(), names.len());
    matrix * &weight_row(names, weights)
}

/// Vector counterpart of [`apply_weights`], for query vectors.
#[must_use]
pub fn apply_weights_vec(
    vector: &Array1<f64>,
    names: &[String],
    weights: &FeatureWeights,
) -> Array1<f64> {
    debug_assert_eq!(vector.len(), names.len());
    vector * &weight_row(names, weights)
}

fn weight_row(names: &[String], weights: &FeatureWeights) -> Array1<f64> {
    names.iter().map(|name| weights.weight(name)).collect()
}

/// Cosine similarity, defined as 0.0 when either vector has zero norm.
#[must_use]
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    a.dot(&b) / (norm_a * norm_b)
}

/// The `k` rows most similar to `query`, as `(row, score)` pairs.
///
/// Rows in `exclude` are forced to [`EXCLUDED_SCORE`] so they sort
/// last; they still count toward `k` when it exceeds the number of
/// non-excluded rows. Results are in descending score order with ties
/// broken by ascending row index. `k` is clamped to the catalog size;
/// `k == 0` yields an empty vector.
#[must_use]
pub fn top_k(
    query: &Array1<f64>,
    matrix: &Array2<f64>,
    k: usize,
    exclude: &[usize],
) -> Vec<(usize, f64)> {
    if k == 0 || matrix.nrows() == 0 {
        return Vec::new();
    }
    let excluded: HashSet<usize> = exclude.iter().copied().collect();

    let mut scored: Vec<(usize, f64)> = matrix
        .outer_iter()
        .enumerate()
        .map(|(row, features)| {
            let score = if excluded.contains(&row) {
                EXCLUDED_SCORE
            } else {
                cosine_similarity(query.view(), features)
            };
            (row, score)
        })
        .collect();

    // Stable sort: equal scores keep ascending row order.
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(k.min(matrix.nrows()));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cosine_parallel_and_opposed() {
        let a = array![1.0, 2.0];
        let b = array![2.0, 4.0];
        let c = array![-1.0, -2.0];
        assert!((cosine_similarity(a.view(), b.view()) - 1.0).abs() < 1e-12);
        assert!((cosine_similarity(a.view(), c.view()) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_cosine_zero_norm_is_zero() {
        let zero = array![0.0, 0.0];
        let other = array![1.0, 1.0];
        assert!(cosine_similarity(zero.view(), other.view()).abs() < f64::EPSILON);
        assert!(cosine_similarity(other.view(), zero.view()).abs() < f64::EPSILON);
    }

    #[test]
    fn test_apply_weights_scales_columns() {
        let matrix = array![[1.0, 1.0], [2.0, 2.0]];
        let names = vec!["energy".to_string(), "other".to_string()];
        let mut map = std::collections::HashMap::new();
        map.insert("energy".to_string(), 2.0);
        let weights = FeatureWeights::from_map(map).unwrap();

        let weighted = apply_weights(&matrix, &names, &weights);
        assert_eq!(weighted, array![[2.0, 1.0], [4.0, 2.0]]);
    }

    #[test]
    fn test_apply_weights_twice_squares() {
        let matrix = array![[1.0, 3.0]];
        let names = vec!["a".to_string(), "b".to_string()];
        let mut map = std::collections::HashMap::new();
        map.insert("a".to_string(), 2.0);
        map.insert("b".to_string(), 0.5);
        let weights = FeatureWeights::from_map(map).unwrap();

        let twice = apply_weights(&apply_weights(&matrix, &names, &weights), &names, &weights);
        assert_eq!(twice, array![[4.0, 0.75]]);
    }

    #[test]
    fn test_top_k_returns_min_k_rows_sorted() {
        let matrix = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]];
        let query = array![1.0, 0.0];

        for k in 0..6 {
            let ranked = top_k(&query, &matrix, k, &[]);
            assert_eq!(ranked.len(), k.min(3));
            for pair in ranked.windows(2) {
                assert!(pair[0].1 >= pair[1].1);
            }
        }
    }

    #[test]
    fn test_top_k_best_match_first() {
        let matrix = array![[1.0, 0.0], [0.0, 1.0], [0.9, 0.1]];
        let query = array![1.0, 0.0];
        let ranked = top_k(&query, &matrix, 3, &[]);
        assert_eq!(ranked[0].0, 0);
        assert_eq!(ranked[1].0, 2);
        assert_eq!(ranked[2].0, 1);
    }

    #[test]
    fn test_excluded_rows_sort_last_with_forced_score() {
        let matrix = array![[1.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let query = array![1.0, 0.0];

        let ranked = top_k(&query, &matrix, 3, &[0]);
        assert_eq!(ranked.last().map(|r| r.0), Some(0));
        assert!((ranked.last().map_or(0.0, |r| r.1) - EXCLUDED_SCORE).abs() < f64::EPSILON);

        // With k small enough, the excluded row never appears.
        let ranked = top_k(&query, &matrix, 2, &[0]);
        assert!(ranked.iter().all(|(row, _)| *row != 0));
    }

    #[test]
    fn test_ties_break_by_ascending_row() {
        let matrix = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let query = array![1.0, 0.0];
        let ranked = top_k(&query, &matrix, 3, &[]);
        // All three rows score exactly 1.0; catalog order wins.
        assert_eq!(
            ranked.iter().map(|(row, _)| *row).collect::<Vec<_>>(),
            vec![0, 1, 2]
        );
    }
}
