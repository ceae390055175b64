//! Engine settings.
//!
//! Loaded from TOML; every field has a default so an empty or missing file
//! yields a working engine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_CACHE_CAPACITY;
use crate::policy::ForkSchedule;
use crate::{Result, RewardError};

/// Complete engine settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Config cache settings.
    #[serde(default)]
    pub cache: CacheSettings,
    /// Hard-fork activation heights.
    #[serde(default)]
    pub forks: ForkSchedule,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Config cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheSettings {
    /// Number of epochs kept.
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level: "trace" | "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_capacity() -> usize {
    DEFAULT_CACHE_CAPACITY
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl EngineSettings {
    /// Parse settings from a TOML document.
    ///
    /// # Errors
    ///
    /// - [`RewardError::InvalidSettings`] if the document does not parse
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| RewardError::InvalidSettings(e.to_string()))
    }

    /// Load settings from `path`, falling back to defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// - [`RewardError::InvalidSettings`] if the file cannot be read or parsed
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| RewardError::InvalidSettings(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Render settings as TOML.
    ///
    /// # Errors
    ///
    /// - [`RewardError::InvalidSettings`] if serialization fails
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| RewardError::InvalidSettings(e.to_string()))
    }
}
