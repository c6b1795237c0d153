//! Feature derivation transforms.
//!
//! Adds the range-normalized, combined, and temporal feature columns
//! the similarity schema expects. Pure: each transform returns a new
//! table. A derived value is only produced when its inputs are present
//! for that row; otherwise it stays missing and the index builder
//! imputes it later.

use std::collections::HashMap;

use cadenza_core::features::{LOUDNESS_FLOOR, TEMPO_CEILING};
use cadenza_core::TrackTable;

/// Run all derivation steps.
///
/// `reference_year` anchors the track-age features (callers normally
/// pass the current year); taking it as an argument keeps the
/// transform deterministic.
#[must_use]
pub fn derive_features(table: &TrackTable, reference_year: i32) -> TrackTable {
    log::info!("deriving features for {} tracks", table.len());
    let table = normalize_ranges(table);
    let table = derived_features(&table);
    temporal_features(&table, reference_year)
}

/// Scale loudness and tempo into `[0, 1]` from their typical ranges.
#[must_use]
pub fn normalize_ranges(table: &TrackTable) -> TrackTable {
    with_columns(
        table,
        &["loudness_normalized", "tempo_normalized"],
        |values| {
            if let Some(loudness) = values.get("loudness").copied() {
                let clipped = loudness.clamp(LOUDNESS_FLOOR, 0.0);
                values.insert(
                    "loudness_normalized".to_string(),
                    (clipped - LOUDNESS_FLOOR) / -LOUDNESS_FLOOR,
                );
            }
            if let Some(tempo) = values.get("tempo").copied() {
                values.insert(
                    "tempo_normalized".to_string(),
                    tempo.clamp(0.0, TEMPO_CEILING) / TEMPO_CEILING,
                );
            }
        },
    )
}

/// Combine raw features into the derived similarity columns.
#[must_use]
pub fn derived_features(table: &TrackTable) -> TrackTable {
    with_columns(
        table,
        &[
            "energy_danceability",
            "mood_score",
            "acoustic_ratio",
            "vocal_presence",
            "intensity",
            "chill_factor",
        ],
        |values| {
            let get = |name: &str, values: &HashMap<String, f64>| values.get(name).copied();

            if let (Some(energy), Some(danceability)) =
                (get("energy", values), get("danceability", values))
            {
                values.insert("energy_danceability".to_string(), energy * danceability);
            }
            if let (Some(valence), Some(energy)) = (get("valence", values), get("energy", values)) {
                values.insert("mood_score".to_string(), (valence + energy) / 2.0);
            }
            if let (Some(acousticness), Some(instrumentalness)) = (
                get("acousticness", values),
                get("instrumentalness", values),
            ) {
                let ratio = acousticness / (1.0 - instrumentalness + 0.001);
                values.insert("acoustic_ratio".to_string(), ratio.clamp(0.0, 10.0));
            }
            if let Some(instrumentalness) = get("instrumentalness", values) {
                values.insert("vocal_presence".to_string(), 1.0 - instrumentalness);
            }
            if let (Some(energy), Some(loudness_normalized)) = (
                get("energy", values),
                get("loudness_normalized", values),
            ) {
                values.insert(
                    "intensity".to_string(),
                    (energy + loudness_normalized) / 2.0,
                );
            }
            if let (Some(energy), Some(acousticness)) =
                (get("energy", values), get("acousticness", values))
            {
                values.insert("chill_factor".to_string(), (1.0 - energy) * acousticness);
            }
        },
    )
}

/// Add track-age and artist-count features.
///
/// Rows with no known release year borrow the catalog's median year for
/// the age feature only; `Track::release_year` stays absent so the
/// year-range filter can still reject them.
#[must_use]
pub fn temporal_features(table: &TrackTable, reference_year: i32) -> TrackTable {
    let mut years: Vec<i32> = table.tracks().filter_map(|t| t.release_year).collect();
    years.sort_unstable();
    let median_year = match years.len() {
        0 => reference_year,
        n if n % 2 == 1 => years[n / 2],
        n => (years[n / 2 - 1] + years[n / 2]) / 2,
    };

    let age_of = |row: usize| {
        let year = table.track(row).release_year.unwrap_or(median_year);
        f64::from((reference_year - year).max(0))
    };
    let max_age = (0..table.len()).map(age_of).fold(0.0_f64, f64::max);

    let mut columns = table.columns().to_vec();
    for name in ["track_age", "track_age_normalized", "artist_count"] {
        if !table.has_column(name) {
            columns.push(name.to_string());
        }
    }

    let mut out = TrackTable::new(columns);
    for row in 0..table.len() {
        let track = table.track(row);
        let mut values = table.row_values(row).clone();
        let age = age_of(row);
        values.insert("track_age".to_string(), age);
        values.insert(
            "track_age_normalized".to_string(),
            if max_age > 0.0 { age / max_age } else { 0.0 },
        );
        let artist_count = track.artists.matches(',').count() + 1;
        values.insert("artist_count".to_string(), artist_count as f64);
        out.push_row(track.clone(), values);
    }
    out
}

fn with_columns(
    table: &TrackTable,
    new_columns: &[&str],
    compute: impl Fn(&mut HashMap<String, f64>),
) -> TrackTable {
    let mut columns = table.columns().to_vec();
    for name in new_columns {
        if !table.has_column(name) {
            columns.push((*name).to_string());
        }
    }
    let mut out = TrackTable::new(columns);
    for row in 0..table.len() {
        let mut values = table.row_values(row).clone();
        compute(&mut values);
        out.push_row(table.track(row).clone(), values);
    }
    out
}
