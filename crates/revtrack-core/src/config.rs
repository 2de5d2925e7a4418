//! Engine configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! due_soon_days = 3
//! min_completed_for_speed = 3
//! period_ordinals = ["first", "second", "third"]
//! unspecified_period = "Unspecified"
//! short_name_warning_len = 4
//! ```

use crate::error::ConfigError;
use crate::temporal::{TemporalPolicy, DEFAULT_DUE_SOON_DAYS};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_due_soon_days() -> i64 {
    DEFAULT_DUE_SOON_DAYS
}

fn default_min_completed_for_speed() -> usize {
    3
}

fn default_period_ordinals() -> Vec<String> {
    [
        "first", "second", "third", "fourth", "fifth", "sixth", "seventh", "eighth", "ninth",
        "tenth",
    ]
    .iter()
    .map(|s| (*s).to_string())
    .collect()
}

fn default_unspecified_period() -> String {
    "Unspecified".to_string()
}

fn default_short_name_warning_len() -> usize {
    4
}

/// Engine-wide tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Inclusive due-soon window in days
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,
    /// Minimum completed assignments before a reviewer appears in speed rankings
    #[serde(default = "default_min_completed_for_speed")]
    pub min_completed_for_speed: usize,
    /// Ordinal words used to order release-period labels
    #[serde(default = "default_period_ordinals")]
    pub period_ordinals: Vec<String>,
    /// Label for protocols without a release period
    #[serde(default = "default_unspecified_period")]
    pub unspecified_period: String,
    /// Substring matches on names shorter than this are flagged
    #[serde(default = "default_short_name_warning_len")]
    pub short_name_warning_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
            min_completed_for_speed: default_min_completed_for_speed(),
            period_ordinals: default_period_ordinals(),
            unspecified_period: default_unspecified_period(),
            short_name_warning_len: default_short_name_warning_len(),
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With due-soon window
    #[inline]
    #[must_use]
    pub fn with_due_soon_days(mut self, days: i64) -> Self {
        self.due_soon_days = days;
        self
    }

    /// With speed-ranking threshold
    #[inline]
    #[must_use]
    pub fn with_min_completed_for_speed(mut self, min: usize) -> Self {
        self.min_completed_for_speed = min;
        self
    }

    /// Temporal policy derived from this config
    #[inline]
    #[must_use]
    pub fn temporal_policy(&self) -> TemporalPolicy {
        TemporalPolicy::new(self.due_soon_days)
    }

    /// Parse and validate TOML text
    ///
    /// # Errors
    /// - `ConfigError::Malformed` for bad TOML or unknown keys
    /// - `ConfigError::Invalid` for out-of-range values
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, otherwise as [`Self::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), "loaded engine config");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `ConfigError::Invalid` naming the first offending field
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.due_soon_days < 0 {
            return Err(ConfigError::Invalid {
                field: "due_soon_days",
                reason: format!("must not be negative, got {}", self.due_soon_days),
            });
        }
        if self.min_completed_for_speed == 0 {
            return Err(ConfigError::Invalid {
                field: "min_completed_for_speed",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.unspecified_period.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "unspecified_period",
                reason: "must not be blank".to_string(),
            });
        }
        Ok(())
    }
}
