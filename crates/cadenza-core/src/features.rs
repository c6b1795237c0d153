//! Canonical feature schema and similarity weights.
//!
//! The similarity engine compares tracks over a fixed, ordered list of
//! numeric feature columns. Column order is authoritative: the stored
//! matrix and every query vector must be laid out in exactly this
//! order. Weights are applied after per-column standardization so that
//! declared importance, not raw variance, determines influence.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Error, Result};

/// The nine raw audio features every catalog row must carry.
pub const RAW_AUDIO_COLUMNS: [&str; 9] = [
    "danceability",
    "energy",
    "loudness",
    "speechiness",
    "acousticness",
    "instrumentalness",
    "liveness",
    "valence",
    "tempo",
];

/// Upper bound used to scale tempo into `[0, 1]`.
pub const TEMPO_CEILING: f64 = 250.0;

/// Lower bound (dBFS) used to scale loudness into `[0, 1]`.
pub const LOUDNESS_FLOOR: f64 = -60.0;

/// The recommended feature columns for similarity computation, in the
/// canonical order.
#[must_use]
pub fn recommended_columns() -> &'static [&'static str] {
    &[
        // Raw audio features
        "danceability",
        "energy",
        "loudness",
        "speechiness",
        "acousticness",
        "instrumentalness",
        "liveness",
        "valence",
        "tempo",
        "mode",
        "key",
        // Range-normalized features
        "loudness_normalized",
        "tempo_normalized",
        // Derived features
        "energy_danceability",
        "mood_score",
        "acoustic_ratio",
        "vocal_presence",
        "intensity",
        "chill_factor",
        // Temporal features
        "track_age_normalized",
    ]
}

/// Per-feature similarity multipliers.
///
/// Names absent from the map weigh 1.0. All configured weights must be
/// positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureWeights {
    weights: HashMap<String, f64>,
}

impl Default for FeatureWeights {
    fn default() -> Self {
        let table: [(&str, f64); 17] = [
            // High importance: core musical character
            ("danceability", 2.0),
            ("energy", 2.0),
            ("valence", 2.0),
            ("tempo_normalized", 2.0),
            // Medium importance: texture and style
            ("acousticness", 1.5),
            ("instrumentalness", 1.5),
            ("loudness_normalized", 1.0),
            // Lower importance: narrow characteristics
            ("speechiness", 0.5),
            ("liveness", 0.5),
            ("mode", 0.3),
            ("key", 0.3),
            // Derived features
            ("mood_score", 2.5),
            ("energy_danceability", 2.0),
            ("vocal_presence", 1.0),
            ("intensity", 1.5),
            ("chill_factor", 1.5),
            // Temporal features
            ("track_age_normalized", 0.5),
        ];
        Self {
            weights: table
                .into_iter()
                .map(|(name, w)| (name.to_string(), w))
                .collect(),
        }
    }
}

impl FeatureWeights {
    /// Weights of 1.0 for every feature.
    #[must_use]
    pub fn uniform() -> Self {
        Self {
            weights: HashMap::new(),
        }
    }

    /// Build from an explicit map, rejecting non-positive entries.
    pub fn from_map(weights: HashMap<String, f64>) -> Result<Self> {
        for (name, weight) in &weights {
            if !weight.is_finite() || *weight <= 0.0 {
                return Err(Error::InvalidData(format!(
                    "weight for feature '{name}' must be positive, got {weight}"
                )));
            }
        }
        Ok(Self { weights })
    }

    /// Load weight overrides from a TOML file.
    ///
    /// The file carries a single `[weights]` table mapping feature
    /// names to positive multipliers.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, parsed, or contains
    /// a non-positive weight.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let file: WeightsFile = toml::from_str(&raw).map_err(|e| {
            Error::InvalidData(format!("cannot parse weights file {}: {e}", path.display()))
        })?;
        let loaded = Self::from_map(file.weights)?;
        log::debug!(
            "loaded {} feature weight overrides from {}",
            loaded.weights.len(),
            path.display()
        );
        Ok(loaded)
    }

    /// The multiplier for a feature name, defaulting to 1.0.
    #[must_use]
    pub fn weight(&self, name: &str) -> f64 {
        self.weights.get(name).copied().unwrap_or(1.0)
    }
}

#[derive(Debug, Deserialize)]
struct WeightsFile {
    #[serde(default)]
    weights: HashMap<String, f64>,
}
