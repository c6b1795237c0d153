//! Catalog CSV reading and writing.
//!
//! The raw catalog is a tabular file with one track per row. Metadata
//! columns (`id`, `name`, `artists`, `popularity`, `release_date` /
//! `release_year`) map onto the `Track` record; every other column is
//! treated as a numeric feature. An unparseable numeric cell becomes a
//! missing value rather than an error.

use chrono::{Datelike, NaiveDate};
use std::collections::HashMap;
use std::path::Path;

use cadenza_core::{Track, TrackTable};

use crate::error::{IngestError, IngestResult};

/// Columns consumed into `Track` metadata rather than feature values.
const META_COLUMNS: [&str; 6] = [
    "id",
    "name",
    "artists",
    "popularity",
    "release_date",
    "release_year",
];

/// Load a catalog table (raw or processed) from a CSV file.
///
/// # Errors
/// Fails when the file cannot be read or has no `id` column.
pub fn load_table(path: &Path) -> IngestResult<TrackTable> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h == name);
    let id_col = column("id").ok_or_else(|| IngestError::MissingColumn {
        column: "id".to_string(),
    })?;
    let name_col = column("name");
    let artists_col = column("artists");
    let popularity_col = column("popularity");
    let release_date_col = column("release_date");
    let release_year_col = column("release_year");

    let feature_columns: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(_, header)| !META_COLUMNS.contains(header))
        .map(|(pos, header)| (pos, header.to_string()))
        .collect();

    let mut table = TrackTable::new(
        feature_columns
            .iter()
            .map(|(_, name)| name.clone())
            .collect(),
    );

    for record in reader.records() {
        let record = record?;
        let field = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or("");

        let mut track = Track::new(
            field(Some(id_col)),
            field(name_col),
        )
        .with_artists(match field(artists_col) {
            "" => "Unknown",
            artists => artists,
        });
        track.popularity = field(popularity_col)
            .parse::<f64>()
            .map(|p| p.clamp(0.0, 100.0) as u8)
            .unwrap_or(0);
        track.release_year = field(release_year_col)
            .parse::<i32>()
            .ok()
            .or_else(|| parse_release_year(field(release_date_col)));

        let mut values = HashMap::with_capacity(feature_columns.len());
        for (pos, name) in &feature_columns {
            if let Some(value) = record.get(*pos).and_then(|v| v.parse::<f64>().ok()) {
                values.insert(name.clone(), value);
            }
        }
        table.push_row(track, values);
    }

    log::info!(
        "loaded {} tracks, {} feature columns from {}",
        table.len(),
        table.columns().len(),
        path.display()
    );
    Ok(table)
}

/// Write a table as CSV: metadata columns first, then every feature
/// column in schema order. Missing values become empty cells.
///
/// # Errors
/// Fails when the file cannot be written.
pub fn write_table(table: &TrackTable, path: &Path) -> IngestResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header: Vec<&str> = vec!["id", "name", "artists", "popularity", "release_year"];
    header.extend(table.columns().iter().map(String::as_str));
    writer.write_record(&header)?;

    for row in 0..table.len() {
        let track = table.track(row);
        let mut record: Vec<String> = vec![
            track.id.clone(),
            track.name.clone(),
            track.artists.clone(),
            track.popularity.to_string(),
            track.release_year.map(|y| y.to_string()).unwrap_or_default(),
        ];
        for column in table.columns() {
            record.push(
                table
                    .value(row, column)
                    .map(|v| v.to_string())
                    .unwrap_or_default(),
            );
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;

    log::info!("wrote {} tracks to {}", table.len(), path.display());
    Ok(())
}

/// Extract a release year from a date string.
///
/// Accepts full dates (`1975-10-31`), year-month (`1975-10`), or bare
/// years (`1975`).
#[must_use]
pub fn parse_release_year(raw: &str) -> Option<i32> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date.year());
    }
    let year: i32 = raw.get(..4)?.parse().ok()?;
    (1000..=3000).contains(&year).then_some(year)
}
