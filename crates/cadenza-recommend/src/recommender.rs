//! Recommendation orchestrator.
//!
//! Resolves a seed track or a desired set of feature values into a
//! query vector, retrieves ranked candidates from the similarity
//! layer, and applies business-level filtering (popularity floor,
//! release-year range, one-track-per-artist diversity).

use ndarray::{Array1, Array2};
use std::collections::HashSet;

use cadenza_core::features::TEMPO_CEILING;
use cadenza_core::{Error, FeatureWeights, Result, Track, TrackTable};
use cadenza_index::{FeatureIndex, ScalerStats, TrackIndex};

use crate::similarity::{apply_weights, apply_weights_vec, top_k};

/// Overfetch multiplier when the diversity filter is on: the
/// per-artist cap rejects many candidates, so ask the engine for more.
/// Fixed heuristic with no adaptive re-query; under-return is accepted.
const DIVERSITY_OVERFETCH: usize = 5;

/// Cap on `find_by_name` results.
const MAX_NAME_MATCHES: usize = 10;

/// Filters applied to seed-based recommendations.
#[derive(Debug, Clone)]
pub struct SeedOptions {
    /// Keep at most one track per distinct artist string.
    pub diversity: bool,
    /// Drop candidates below this popularity, when set.
    pub min_popularity: Option<u8>,
    /// Keep only candidates released inside this inclusive range;
    /// candidates with no known year are dropped when set.
    pub year_range: Option<(i32, i32)>,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            diversity: true,
            min_popularity: None,
            year_range: None,
        }
    }
}

impl SeedOptions {
    #[must_use]
    pub fn with_diversity(mut self, diversity: bool) -> Self {
        self.diversity = diversity;
        self
    }

    #[must_use]
    pub fn with_min_popularity(mut self, min_popularity: u8) -> Self {
        self.min_popularity = Some(min_popularity);
        self
    }

    #[must_use]
    pub fn with_year_range(mut self, low: i32, high: i32) -> Self {
        self.year_range = Some((low, high));
        self
    }
}

/// Desired audio-feature values for a synthetic query.
#[derive(Debug, Clone, Copy)]
pub struct FeatureTarget {
    /// Danceability in `[0, 1]`.
    pub danceability: f64,
    /// Energy in `[0, 1]`.
    pub energy: f64,
    /// Valence (musical positiveness) in `[0, 1]`.
    pub valence: f64,
    /// Tempo in BPM.
    pub tempo: f64,
}

/// One ranked recommendation with display metadata and the headline
/// audio features joined back from the catalog table.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub track: Track,
    /// Cosine similarity to the query, in `[-1, 1]`.
    pub score: f64,
    pub danceability: f64,
    pub energy: f64,
    pub valence: f64,
    pub tempo: f64,
}

/// Content-based recommender over one loaded index generation.
///
/// Everything is immutable after construction; both entry points are
/// pure functions of the loaded state and their arguments, so shared
/// read-only use is safe.
#[derive(Debug)]
pub struct Recommender {
    weighted: Array2<f64>,
    tracks: TrackIndex,
    stats: ScalerStats,
    columns: Vec<String>,
    weights: FeatureWeights,
    /// Per-column medians of the stored (normalized) matrix, used to
    /// fill unspecified features in synthetic queries.
    medians: Vec<f64>,
    table: TrackTable,
}

impl Recommender {
    /// Assemble a recommender from a loaded index, the parallel
    /// full-metadata table, and the weight table.
    ///
    /// # Errors
    /// Returns `CorruptIndex` when the metadata table row count
    /// disagrees with the index.
    pub fn new(index: FeatureIndex, table: TrackTable, weights: FeatureWeights) -> Result<Self> {
        if table.len() != index.n_tracks() {
            return Err(Error::CorruptIndex(format!(
                "metadata table has {} rows but index has {} tracks",
                table.len(),
                index.n_tracks()
            )));
        }

        let medians = column_medians(index.matrix());
        let (matrix, tracks, stats, columns) = index.into_parts();
        let weighted = apply_weights(&matrix, &columns, &weights);

        log::info!("recommender initialized with {} tracks", tracks.len());
        Ok(Self {
            weighted,
            tracks,
            stats,
            columns,
            weights,
            medians,
            table,
        })
    }

    #[must_use]
    pub fn n_tracks(&self) -> usize {
        self.tracks.len()
    }

    /// Case-insensitive substring search over track names, optionally
    /// narrowed by artist. Returns at most ten matches in catalog
    /// order.
    #[must_use]
    pub fn find_by_name(&self, name: &str, artist: Option<&str>) -> Vec<Track> {
        let name = name.to_lowercase();
        let artist = artist.map(str::to_lowercase);
        self.table
            .tracks()
            .filter(|track| track.name.to_lowercase().contains(&name))
            .filter(|track| match &artist {
                Some(artist) => track.artists.to_lowercase().contains(artist),
                None => true,
            })
            .take(MAX_NAME_MATCHES)
            .cloned()
            .collect()
    }

    /// Recommend up to `n` tracks similar to the seed track.
    ///
    /// The seed's own (already weighted) catalog row is the query, so
    /// no re-normalization happens. Candidates are walked in ranked
    /// order with the seed excluded; filters may leave fewer than `n`
    /// results, which is not an error.
    ///
    /// # Errors
    /// Returns `UnknownTrack` when `track_id` is not in the index.
    pub fn recommend_by_seed(
        &self,
        track_id: &str,
        n: usize,
        options: &SeedOptions,
    ) -> Result<Vec<Recommendation>> {
        let seed_row = self.tracks.row_of(track_id).ok_or_else(|| Error::UnknownTrack {
            id: track_id.to_string(),
        })?;
        if n == 0 {
            return Ok(Vec::new());
        }

        let query = self.weighted.row(seed_row).to_owned();
        let k = if options.diversity {
            n.saturating_mul(DIVERSITY_OVERFETCH)
        } else {
            n
        };
        let ranked = top_k(&query, &self.weighted, k.min(self.n_tracks()), &[seed_row]);

        let mut recommendations = Vec::with_capacity(n);
        let mut seen_artists: HashSet<&str> = HashSet::new();
        for (row, score) in ranked {
            if row == seed_row {
                // Excluded row, present only with its forced score.
                continue;
            }
            let track = self.table.track(row);
            if let Some(floor) = options.min_popularity {
                if track.popularity < floor {
                    continue;
                }
            }
            if let Some((low, high)) = options.year_range {
                match track.release_year {
                    Some(year) if (low..=high).contains(&year) => {}
                    _ => continue,
                }
            }
            if options.diversity && !seen_artists.insert(track.artists.as_str()) {
                continue;
            }
            recommendations.push(self.enrich(row, score));
            if recommendations.len() == n {
                break;
            }
        }

        if recommendations.len() < n {
            log::debug!(
                "seed '{track_id}': {} of {n} requested recommendations after filtering",
                recommendations.len()
            );
        }
        Ok(recommendations)
    }

    /// Recommend up to `n` tracks matching desired feature values.
    ///
    /// Builds a synthetic raw vector over the full schema: the four
    /// named features take the requested values, `tempo_normalized`
    /// derives from the tempo, and every other column takes its median
    /// from the stored matrix. The vector is then standardized with the
    /// persisted statistics and weighted like the corpus. No exclusions
    /// and no post-filters in this mode.
    #[must_use]
    pub fn recommend_by_features(&self, target: &FeatureTarget, n: usize) -> Vec<Recommendation> {
        let raw: Array1<f64> = self
            .columns
            .iter()
            .enumerate()
            .map(|(col, name)| match name.as_str() {
                "danceability" => target.danceability,
                "energy" => target.energy,
                "valence" => target.valence,
                "tempo" => target.tempo,
                "tempo_normalized" => target.tempo / TEMPO_CEILING,
                _ => self.medians[col],
            })
            .collect();

        let query = self.stats.standardize(&raw);
        let query = apply_weights_vec(&query, &self.columns, &self.weights);

        top_k(&query, &self.weighted, n, &[])
            .into_iter()
            .map(|(row, score)| self.enrich(row, score))
            .collect()
    }

    /// Join a ranked row back to its full display metadata.
    fn enrich(&self, row: usize, score: f64) -> Recommendation {
        Recommendation {
            track: self.table.track(row).clone(),
            score,
            danceability: self.table.value(row, "danceability").unwrap_or(0.0),
            energy: self.table.value(row, "energy").unwrap_or(0.0),
            valence: self.table.value(row, "valence").unwrap_or(0.0),
            tempo: self.table.value(row, "tempo").unwrap_or(0.0),
        }
    }
}

/// Median of each column of the stored matrix.
fn column_medians(matrix: &Array2<f64>) -> Vec<f64> {
    matrix
        .columns()
        .into_iter()
        .map(|column| {
            let mut values: Vec<f64> = column.iter().copied().collect();
            values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            match values.len() {
                0 => 0.0,
                n if n % 2 == 1 => values[n / 2],
                n => (values[n / 2 - 1] + values[n / 2]) / 2.0,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::collections::HashMap;

    fn two_feature_table(rows: &[(&str, &str, &str, f64, f64)]) -> TrackTable {
        let columns = vec!["danceability".to_string(), "energy".to_string()];
        let mut table = TrackTable::new(columns);
        for (id, name, artist, danceability, energy) in rows {
            table.push_row(
                Track::new(*id, *name)
                    .with_artists(*artist)
                    .with_popularity(50)
                    .with_release_year(2000),
                HashMap::from([
                    ("danceability".to_string(), *danceability),
                    ("energy".to_string(), *energy),
                ]),
            );
        }
        table
    }

    fn recommender(rows: &[(&str, &str, &str, f64, f64)]) -> Recommender {
        let table = two_feature_table(rows);
        let columns = vec!["danceability".to_string(), "energy".to_string()];
        let index = FeatureIndex::build(&table, &columns).unwrap();
        Recommender::new(index, table, FeatureWeights::uniform()).unwrap()
    }

    #[test]
    fn test_unknown_seed_errors() {
        let rec = recommender(&[("a", "Alpha", "Anna", 0.5, 0.5)]);
        let err = rec
            .recommend_by_seed("missing", 5, &SeedOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownTrack { id } if id == "missing"));
    }

    #[test]
    fn test_seed_never_in_results() {
        let rec = recommender(&[
            ("a", "Alpha", "Anna", 0.9, 0.9),
            ("b", "Beta", "Ben", 0.1, 0.1),
            ("c", "Gamma", "Cass", 0.85, 0.95),
        ]);
        let recs = rec
            .recommend_by_seed("a", 10, &SeedOptions::default())
            .unwrap();
        assert!(recs.iter().all(|r| r.track.id != "a"));
    }

    #[test]
    fn test_cosine_ranking_favors_closer_track() {
        let rec = recommender(&[
            ("a", "Alpha", "Anna", 0.9, 0.9),
            ("b", "Beta", "Ben", 0.1, 0.1),
            ("c", "Gamma", "Cass", 0.85, 0.95),
        ]);
        let recs = rec
            .recommend_by_seed("a", 2, &SeedOptions::default().with_diversity(false))
            .unwrap();
        assert_eq!(recs[0].track.id, "c");
        assert_eq!(recs[1].track.id, "b");
        assert!(recs[0].score >= recs[1].score);
    }

    #[test]
    fn test_diversity_one_track_per_artist() {
        let rec = recommender(&[
            ("a", "Alpha", "Anna", 0.8, 0.8),
            ("b1", "Beta One", "Ben", 0.81, 0.8),
            ("b2", "Beta Two", "Ben", 0.79, 0.8),
            ("c", "Gamma", "Cass", 0.8, 0.81),
            ("d", "Delta", "Dee", 0.78, 0.82),
        ]);
        let recs = rec
            .recommend_by_seed("a", 4, &SeedOptions::default())
            .unwrap();
        let mut artists: Vec<&str> = recs.iter().map(|r| r.track.artists.as_str()).collect();
        let before = artists.len();
        artists.sort_unstable();
        artists.dedup();
        assert_eq!(artists.len(), before, "duplicate artist in {recs:?}");
    }

    #[test]
    fn test_impossible_popularity_floor_yields_empty() {
        let rec = recommender(&[
            ("a", "Alpha", "Anna", 0.9, 0.9),
            ("b", "Beta", "Ben", 0.1, 0.1),
        ]);
        let recs = rec
            .recommend_by_seed("a", 5, &SeedOptions::default().with_min_popularity(90))
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_year_filter_rejects_missing_year() {
        let columns = vec!["danceability".to_string(), "energy".to_string()];
        let mut table = TrackTable::new(columns.clone());
        table.push_row(
            Track::new("a", "Alpha").with_release_year(1999),
            HashMap::from([
                ("danceability".to_string(), 0.5),
                ("energy".to_string(), 0.5),
            ]),
        );
        // No release year on this one.
        table.push_row(
            Track::new("b", "Beta"),
            HashMap::from([
                ("danceability".to_string(), 0.5),
                ("energy".to_string(), 0.6),
            ]),
        );
        let index = FeatureIndex::build(&table, &columns).unwrap();
        let rec = Recommender::new(index, table, FeatureWeights::uniform()).unwrap();

        let recs = rec
            .recommend_by_seed("a", 5, &SeedOptions::default().with_year_range(1990, 2010))
            .unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn test_feature_target_matches_near_identical_track() {
        let rec = recommender(&[
            ("a", "Alpha", "Anna", 1.0, 1.0),
            ("b", "Beta", "Ben", 0.2, 0.3),
            ("c", "Gamma", "Cass", 0.6, 0.1),
        ]);
        let target = FeatureTarget {
            danceability: 1.0,
            energy: 1.0,
            valence: 0.5,
            tempo: 120.0,
        };
        let recs = rec.recommend_by_features(&target, 3);
        assert_eq!(recs.len(), 3);
        assert_eq!(recs[0].track.id, "a");
        assert!(recs[0].score > 0.99, "score was {}", recs[0].score);
    }

    #[test]
    fn test_find_by_name() {
        let rec = recommender(&[
            ("a", "Bohemian Rhapsody", "Queen", 0.4, 0.9),
            ("b", "Rhapsody in Blue", "Gershwin", 0.3, 0.5),
            ("c", "Alpha", "Anna", 0.5, 0.5),
        ]);
        assert_eq!(rec.find_by_name("rhapsody", None).len(), 2);
        let queen = rec.find_by_name("rhapsody", Some("queen"));
        assert_eq!(queen.len(), 1);
        assert_eq!(queen[0].id, "a");
        assert!(rec.find_by_name("nocturne", None).is_empty());
    }

    #[test]
    fn test_table_row_mismatch_rejected() {
        let table = two_feature_table(&[
            ("a", "Alpha", "Anna", 0.5, 0.5),
            ("b", "Beta", "Ben", 0.6, 0.4),
        ]);
        let columns = vec!["danceability".to_string(), "energy".to_string()];
        let index = FeatureIndex::build(&table, &columns).unwrap();

        let shorter = two_feature_table(&[("a", "Alpha", "Anna", 0.5, 0.5)]);
        let err = Recommender::new(index, shorter, FeatureWeights::uniform()).unwrap_err();
        assert!(matches!(err, Error::CorruptIndex(_)));
    }

    #[test]
    fn test_column_medians() {
        let matrix = array![[1.0, 10.0], [3.0, 20.0], [2.0, 40.0]];
        let medians = column_medians(&matrix);
        assert!((medians[0] - 2.0).abs() < 1e-12);
        assert!((medians[1] - 20.0).abs() < 1e-12);
    }
}
