use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for cadenza.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. Explicit overrides from the caller (highest priority)
/// 2. Environment variables (CADENZA_* prefix)
/// 3. Config file (~/.config/cadenza/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the raw catalog CSV.
    ///
    /// Can be set via:
    /// - ENV: CADENZA_RAW_DATA_PATH
    /// - Config: raw_data_path = "/path/to/tracks.csv"
    #[serde(default = "default_raw_data_path")]
    pub raw_data_path: PathBuf,

    /// Directory for the processed table and preprocessing report.
    ///
    /// Can be set via:
    /// - ENV: CADENZA_PROCESSED_DIR
    /// - Config: processed_dir = "/path/to/processed"
    #[serde(default = "default_processed_dir")]
    pub processed_dir: PathBuf,

    /// Directory for the persisted index artifacts.
    ///
    /// Can be set via:
    /// - ENV: CADENZA_MODEL_DIR
    /// - Config: model_dir = "/path/to/models"
    #[serde(default = "default_model_dir")]
    pub model_dir: PathBuf,

    /// Optional TOML file with feature-weight overrides.
    pub weights_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            raw_data_path: default_raw_data_path(),
            processed_dir: default_processed_dir(),
            model_dir: default_model_dir(),
            weights_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/cadenza/config.toml
    /// Reads environment variables with CADENZA_ prefix.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("cadenza");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let config: Self = builder.build().context("Failed to build configuration")?;

        Ok(config)
    }

    /// Load configuration with a custom model directory.
    ///
    /// # Errors
    /// Returns an error if the underlying load fails.
    pub fn load_with_model_dir(model_dir: PathBuf) -> Result<Self> {
        let mut config = Self::load()?;
        config.model_dir = model_dir;
        Ok(config)
    }
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
}

fn default_raw_data_path() -> PathBuf {
    data_dir().join("tracks.csv")
}

fn default_processed_dir() -> PathBuf {
    data_dir().join("processed")
}

fn default_model_dir() -> PathBuf {
    data_dir().join("models")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/cadenza/config.toml
/// - macOS: ~/Library/Application Support/cadenza/config.toml
/// - Windows: %APPDATA%\cadenza\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cadenza")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# Cadenza Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. Explicit overrides from the caller (highest priority)
# 2. Environment variables (CADENZA_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# Path to the raw catalog CSV produced by the collection step
#raw_data_path = "/path/to/tracks.csv"

# Directory for the processed table and preprocessing report
#processed_dir = "/path/to/processed"

# Directory for the persisted index artifacts
#model_dir = "/path/to/models"

# Optional TOML file overriding the default feature weights, e.g.
#
#   [weights]
#   energy = 3.0
#   mood_score = 2.0
#
#weights_path = "/path/to/weights.toml"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
///
/// # Errors
/// Returns an error if the directory or file cannot be created.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}
