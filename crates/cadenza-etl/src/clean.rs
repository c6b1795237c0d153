//! Catalog cleaning transforms.
//!
//! Each step is a pure function from one table to a new table; `clean`
//! composes them and reports per-step removal counts.

use serde::Serialize;
use std::collections::HashSet;

use cadenza_core::features::RAW_AUDIO_COLUMNS;
use cadenza_core::{Track, TrackTable};

const MIN_DURATION_MS: f64 = 10_000.0;
const MAX_DURATION_MS: f64 = 1_800_000.0;

/// Counts of what each cleaning step changed or removed.
#[derive(Debug, Default, Clone, Serialize)]
pub struct CleanReport {
    pub original_count: usize,
    pub filled_names: usize,
    pub missing_features_dropped: usize,
    pub duplicates_dropped: usize,
    pub invalid_tempo_dropped: usize,
    pub invalid_duration_dropped: usize,
    pub final_count: usize,
}

impl CleanReport {
    #[must_use]
    pub fn removed(&self) -> usize {
        self.original_count - self.final_count
    }
}

/// Run all cleaning steps in order.
#[must_use]
pub fn clean(table: &TrackTable) -> (TrackTable, CleanReport) {
    let mut report = CleanReport {
        original_count: table.len(),
        ..CleanReport::default()
    };
    log::info!("cleaning {} tracks", table.len());

    let (table, filled) = fill_missing_names(table);
    report.filled_names = filled;

    let (table, dropped) = drop_missing_audio_features(&table);
    report.missing_features_dropped = dropped;

    let (table, dropped) = dedupe_by_id(&table);
    report.duplicates_dropped = dropped;

    let (table, dropped) = drop_invalid_tempo(&table);
    report.invalid_tempo_dropped = dropped;

    let (table, dropped) = drop_invalid_duration(&table);
    report.invalid_duration_dropped = dropped;

    report.final_count = table.len();
    log::info!(
        "cleaning complete: removed {} of {} tracks",
        report.removed(),
        report.original_count
    );
    (table, report)
}

/// Replace empty track names with `"Unknown Track"`.
#[must_use]
pub fn fill_missing_names(table: &TrackTable) -> (TrackTable, usize) {
    let mut out = TrackTable::new(table.columns().to_vec());
    let mut filled = 0;
    for row in 0..table.len() {
        let mut track = table.track(row).clone();
        if track.name.trim().is_empty() {
            track.name = "Unknown Track".to_string();
            filled += 1;
        }
        out.push_row(track, table.row_values(row).clone());
    }
    if filled > 0 {
        log::info!("filled {filled} missing track names");
    }
    (out, filled)
}

/// Drop rows missing any of the raw audio features.
#[must_use]
pub fn drop_missing_audio_features(table: &TrackTable) -> (TrackTable, usize) {
    let required: Vec<&str> = RAW_AUDIO_COLUMNS
        .into_iter()
        .filter(|c| {
            if table.has_column(c) {
                true
            } else {
                log::warn!("audio feature column '{c}' absent from input table");
                false
            }
        })
        .collect();

    retain(table, |row| {
        required.iter().all(|c| table.value(row, c).is_some())
    })
}

/// Keep the first occurrence of each track id.
#[must_use]
pub fn dedupe_by_id(table: &TrackTable) -> (TrackTable, usize) {
    let mut seen: HashSet<&str> = HashSet::with_capacity(table.len());
    let keep: Vec<bool> = (0..table.len())
        .map(|row| seen.insert(table.track(row).id.as_str()))
        .collect();
    retain(table, |row| keep[row])
}

/// Drop rows with non-positive tempo (extraction errors).
#[must_use]
pub fn drop_invalid_tempo(table: &TrackTable) -> (TrackTable, usize) {
    if !table.has_column("tempo") {
        return (table.clone(), 0);
    }
    retain(table, |row| {
        table.value(row, "tempo").is_some_and(|t| t > 0.0)
    })
}

/// Drop rows shorter than 10 seconds or longer than 30 minutes.
#[must_use]
pub fn drop_invalid_duration(table: &TrackTable) -> (TrackTable, usize) {
    if !table.has_column("duration_ms") {
        return (table.clone(), 0);
    }
    retain(table, |row| {
        table
            .value(row, "duration_ms")
            .is_some_and(|d| (MIN_DURATION_MS..=MAX_DURATION_MS).contains(&d))
    })
}

fn retain(table: &TrackTable, keep: impl Fn(usize) -> bool) -> (TrackTable, usize) {
    let mut out = TrackTable::new(table.columns().to_vec());
    for row in 0..table.len() {
        if keep(row) {
            out.push_row(table.track(row).clone(), table.row_values(row).clone());
        }
    }
    let dropped = table.len() - out.len();
    (out, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn full_values(tempo: f64, duration: f64) -> HashMap<String, f64> {
        let mut values: HashMap<String, f64> = RAW_AUDIO_COLUMNS
            .into_iter()
            .map(|c| (c.to_string(), 0.5))
            .collect();
        values.insert("tempo".to_string(), tempo);
        values.insert("duration_ms".to_string(), duration);
        values
    }

    fn schema() -> Vec<String> {
        let mut columns: Vec<String> = RAW_AUDIO_COLUMNS.into_iter().map(String::from).collect();
        columns.push("duration_ms".to_string());
        columns
    }

    #[test]
    fn test_fill_missing_names() {
        let mut table = TrackTable::new(schema());
        table.push_row(Track::new("a", ""), full_values(120.0, 200_000.0));
        table.push_row(Track::new("b", "Beta"), full_values(120.0, 200_000.0));

        let (cleaned, filled) = fill_missing_names(&table);
        assert_eq!(filled, 1);
        assert_eq!(cleaned.track(0).name, "Unknown Track");
        assert_eq!(cleaned.track(1).name, "Beta");
    }

    #[test]
    fn test_drop_missing_audio_features() {
        let mut table = TrackTable::new(schema());
        table.push_row(Track::new("a", "A"), full_values(120.0, 200_000.0));
        let mut partial = full_values(120.0, 200_000.0);
        partial.remove("valence");
        table.push_row(Track::new("b", "B"), partial);

        let (cleaned, dropped) = drop_missing_audio_features(&table);
        assert_eq!(dropped, 1);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.track(0).id, "a");
    }

    #[test]
    fn test_dedupe_keeps_first() {
        let mut table = TrackTable::new(schema());
        table.push_row(Track::new("a", "First"), full_values(120.0, 200_000.0));
        table.push_row(Track::new("a", "Second"), full_values(90.0, 200_000.0));

        let (cleaned, dropped) = dedupe_by_id(&table);
        assert_eq!(dropped, 1);
        assert_eq!(cleaned.track(0).name, "First");
    }

    #[test]
    fn test_invalid_tempo_and_duration() {
        let mut table = TrackTable::new(schema());
        table.push_row(Track::new("a", "A"), full_values(120.0, 200_000.0));
        table.push_row(Track::new("b", "B"), full_values(0.0, 200_000.0));
        table.push_row(Track::new("c", "C"), full_values(120.0, 5_000.0));
        table.push_row(Track::new("d", "D"), full_values(120.0, 2_000_000.0));

        let (cleaned, report) = clean(&table);
        assert_eq!(cleaned.len(), 1);
        assert_eq!(cleaned.track(0).id, "a");
        assert_eq!(report.invalid_tempo_dropped, 1);
        assert_eq!(report.invalid_duration_dropped, 2);
        assert_eq!(report.removed(), 3);
    }
}
