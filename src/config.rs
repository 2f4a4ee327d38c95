//! Application settings.
//!
//! Settings are read from a TOML file and control where state and the
//! activity log are kept, the default scheduler interval, and extra extensions
//! for the built-in categories.
//!
//! # Configuration File Format
//!
//! ```toml
//! state_file = "organizer_state.json"
//! log_file = "organizer_log.txt"
//! default_interval_minutes = 5
//!
//! [categories]
//! Images = [".heic", "raw"]
//! Documents = [".md"]
//! ```

use crate::file_category::{Category, FileMapper};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".autosortrc.toml";

/// Errors that can occur during configuration loading.
#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),
    /// A `[categories]` key that is not a known category.
    #[error("Unknown category '{0}' in configuration")]
    UnknownCategory(String),
    /// A default interval that is zero or negative.
    #[error("default_interval_minutes must be greater than zero, got {0}")]
    InvalidInterval(i64),
    /// IO error while reading configuration.
    #[error("IO error reading configuration: {0}")]
    IoError(String),
}

/// Settings deserialized from the configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Where history, last folder and interval are persisted.
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,

    /// Where the activity log is written.
    #[serde(default = "default_log_file")]
    pub log_file: PathBuf,

    /// Interval used before one has ever been saved.
    #[serde(default = "default_interval_minutes")]
    pub default_interval_minutes: i64,

    /// Extra extensions per category name.
    #[serde(default)]
    pub categories: BTreeMap<String, Vec<String>>,

    /// The file these settings were read from, if any.
    #[serde(skip)]
    pub loaded_from: Option<PathBuf>,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("organizer_state.json")
}

fn default_log_file() -> PathBuf {
    PathBuf::from("organizer_log.txt")
}

fn default_interval_minutes() -> i64 {
    crate::history::DEFAULT_SCHEDULE_MINUTES
}

impl Settings {
    /// Load settings from a file, with fallback to defaults.
    ///
    /// Attempts to load settings in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.autosortrc.toml` in the current directory
    /// 3. Look for `~/.config/autosort/config.toml` in home directory
    /// 4. Fall back to default settings
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any file found is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("autosort")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load settings from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        let mut settings: Settings =
            toml::from_str(&content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        settings.validate()?;
        settings.loaded_from = Some(path.to_path_buf());
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_interval_minutes <= 0 {
            return Err(ConfigError::InvalidInterval(self.default_interval_minutes));
        }
        for name in self.categories.keys() {
            name.parse::<Category>()
                .map_err(|_| ConfigError::UnknownCategory(name.clone()))?;
        }
        Ok(())
    }

    /// Builds the category table: the standard one plus configured extras.
    pub fn file_mapper(&self) -> Result<FileMapper, ConfigError> {
        let mut mapper = FileMapper::default();
        for (name, extensions) in &self.categories {
            let category = name
                .parse::<Category>()
                .map_err(|_| ConfigError::UnknownCategory(name.clone()))?;
            for ext in extensions {
                mapper.add_extension_mapping(ext, category);
            }
        }
        Ok(mapper)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            log_file: default_log_file(),
            default_interval_minutes: default_interval_minutes(),
            categories: BTreeMap::new(),
            loaded_from: None,
        }
    }
}
