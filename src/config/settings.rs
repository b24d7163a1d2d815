//! TOML-based configuration for pivotal.
//!
//! Example configuration:
//! ```toml
//! [engine]
//! init_timeout_secs = 100
//!
//! [loader]
//! table_name = "pivot_data"
//! batch_size = 500
//! fold_case = true
//! verify_count = true
//!
//! [inference]
//! strategy = "striped"  # or "random"
//! max_samples = 30
//! numeric_threshold = 0.6
//!
//! [pivot]
//! round_digits = 2
//!
//! [cohort]
//! table_name = "cohort_data"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::inference::SamplingStrategy;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub engine: EngineSettings,
    pub loader: LoaderSettings,
    pub inference: InferenceSettings,
    pub pivot: PivotSettings,
    pub cohort: CohortSettings,
}

/// Engine lifecycle settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Upper bound on engine instantiation, in seconds.
    pub init_timeout_secs: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            init_timeout_secs: 100,
        }
    }
}

impl EngineSettings {
    pub fn init_timeout(&self) -> Duration {
        Duration::from_secs(self.init_timeout_secs)
    }
}

/// Loader settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct LoaderSettings {
    /// Working table the pivot compiler reads from.
    pub table_name: String,

    /// Rows per INSERT statement.
    pub batch_size: usize,

    /// Lower-case text values on load.
    pub fold_case: bool,

    /// Run `SELECT COUNT(*)` after loading.
    pub verify_count: bool,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            table_name: "pivot_data".to_string(),
            batch_size: 500,
            fold_case: true,
            verify_count: true,
        }
    }
}

/// Type inference settings.
///
/// Unset `max_samples` and `numeric_threshold` fall back to the strategy's
/// own defaults.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InferenceSettings {
    pub strategy: SamplingStrategy,
    pub max_samples: Option<usize>,
    pub numeric_threshold: Option<f64>,

    /// Seed for the random strategy.
    pub seed: Option<u64>,
}

/// Pivot compiler settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct PivotSettings {
    /// Decimal places for non-count aggregates.
    pub round_digits: u32,
}

impl Default for PivotSettings {
    fn default() -> Self {
        Self { round_digits: 2 }
    }
}

/// Cohort grouping settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CohortSettings {
    pub table_name: String,
}

impl Default for CohortSettings {
    fn default() -> Self {
        Self {
            table_name: "cohort_data".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `PIVOTAL_CONFIG`
    /// 2. `./pivotal.toml`
    /// 3. `~/.config/pivotal/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("PIVOTAL_CONFIG") {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("pivotal.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("pivotal").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Reject values no component can work with.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.engine.init_timeout_secs == 0 {
            return Err(SettingsError::InvalidConfig(
                "engine.init_timeout_secs must be positive".into(),
            ));
        }
        if self.loader.batch_size == 0 {
            return Err(SettingsError::InvalidConfig(
                "loader.batch_size must be positive".into(),
            ));
        }
        for (key, table) in [
            ("loader.table_name", &self.loader.table_name),
            ("cohort.table_name", &self.cohort.table_name),
        ] {
            if table.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!("{key} must not be empty")));
            }
        }
        if self.loader.table_name == self.cohort.table_name {
            return Err(SettingsError::InvalidConfig(
                "loader.table_name and cohort.table_name must differ".into(),
            ));
        }
        if self.inference.max_samples == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "inference.max_samples must be positive".into(),
            ));
        }
        if let Some(threshold) = self.inference.numeric_threshold {
            if !(0.0..=1.0).contains(&threshold) {
                return Err(SettingsError::InvalidConfig(format!(
                    "inference.numeric_threshold must be within 0..=1, got {threshold}"
                )));
            }
        }
        Ok(())
    }
}
