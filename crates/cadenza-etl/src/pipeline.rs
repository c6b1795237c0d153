//! The preprocessing pipeline: load → clean → derive → persist.

use chrono::{Datelike, Utc};
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use cadenza_core::TrackTable;

use crate::clean::{clean, CleanReport};
use crate::config::Config;
use crate::derive::derive_features;
use crate::error::IngestResult;
use crate::load::{load_table, write_table};

const PROCESSED_FILE: &str = "tracks_processed.csv";
const REPORT_FILE: &str = "preprocessing_report.json";

/// Summary of one pipeline run, written beside the processed table.
#[derive(Debug, Serialize)]
pub struct PipelineReport {
    pub raw_tracks: usize,
    pub final_tracks: usize,
    pub columns_before: usize,
    pub columns_after: usize,
    pub cleaning: CleanReport,
}

/// Runs the full preprocessing pipeline over one raw catalog file.
#[derive(Debug)]
pub struct Pipeline {
    raw_data_path: PathBuf,
    output_dir: PathBuf,
}

impl Pipeline {
    #[must_use]
    pub fn new(raw_data_path: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            raw_data_path,
            output_dir,
        }
    }

    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.raw_data_path.clone(), config.processed_dir.clone())
    }

    /// Run the pipeline and return the processed table.
    ///
    /// Writes `tracks_processed.csv` and `preprocessing_report.json`
    /// into the output directory.
    ///
    /// # Errors
    /// Fails when the raw file cannot be read or the outputs cannot be
    /// written.
    pub fn run(&self) -> IngestResult<TrackTable> {
        log::info!("preprocessing {}", self.raw_data_path.display());
        let raw = load_table(&self.raw_data_path)?;
        let columns_before = raw.columns().len();

        let (cleaned, cleaning) = clean(&raw);
        let processed = derive_features(&cleaned, Utc::now().year());

        std::fs::create_dir_all(&self.output_dir)?;
        write_table(&processed, &self.output_dir.join(PROCESSED_FILE))?;

        let report = PipelineReport {
            raw_tracks: raw.len(),
            final_tracks: processed.len(),
            columns_before,
            columns_after: processed.columns().len(),
            cleaning,
        };
        let writer = BufWriter::new(File::create(self.output_dir.join(REPORT_FILE))?);
        serde_json::to_writer_pretty(writer, &report)?;

        log::info!(
            "preprocessing complete: {} of {} tracks kept, {} feature columns",
            report.final_tracks,
            report.raw_tracks,
            report.columns_after
        );
        Ok(processed)
    }
}
