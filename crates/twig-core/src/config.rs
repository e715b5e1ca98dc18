use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::fork::ForkOption;

/// Title given to a fork whose original conversation had none.
pub const DEFAULT_TITLE: &str = "New Chat";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForkConfig {
    /// Used when a request names no fork option.
    pub default_option: ForkOption,
    pub default_title: String,
    /// Keep copied `createdAt` values strictly increasing from parent to child.
    pub monotonic_timestamps: bool,
}

impl Default for ForkConfig {
    fn default() -> Self {
        Self {
            default_option: ForkOption::DirectPath,
            default_title: DEFAULT_TITLE.to_string(),
            monotonic_timestamps: true,
        }
    }
}

impl ForkConfig {
    /// Get the path to the user-level config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            Error::Configuration("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("twig").join("config.toml"))
    }

    /// Load the user-level config, or defaults if there is none.
    ///
    /// A file that fails to parse is reported and ignored.
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        match Self::load_from(&path) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!(
                    target: "twig::config",
                    path = %path.display(),
                    "Failed to load config, using defaults: {e}"
                );
                Ok(Self::default())
            }
        }
    }

    /// Load an explicitly named config file. Unlike [`ForkConfig::load`], a
    /// missing or malformed file is an error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("Failed to read {}: {e}", path.display()))
        })?;
        Self::from_toml(&contents)
            .map_err(|e| Error::Configuration(format!("Failed to parse {}: {e}", path.display())))
    }

    pub fn from_toml(contents: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Configuration(format!("Failed to serialize config: {e}")))
    }
}
