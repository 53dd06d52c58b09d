use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{JotterError, Result};

/// Longest accepted debounce delay: one day.
pub const MAX_DEBOUNCE_MS: u64 = 86_400_000;

/// Settings for a notebook session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotebookConfig {
    /// Quiet period after the last edit before a note is written
    pub debounce_ms: u64,
    /// Title used when a note's first block has no text
    pub default_title: String,
    /// Store key holding the ordered list of note ids
    pub index_key: String,
    /// Prefix for per-note record keys (`<prefix><id>`)
    pub record_prefix: String,
}

impl Default for NotebookConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 300,
            default_title: "New Note".to_string(),
            index_key: "notes".to_string(),
            record_prefix: "notes:".to_string(),
        }
    }
}

impl NotebookConfig {
    /// Parse a config from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: NotebookConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        if self.debounce_ms > MAX_DEBOUNCE_MS {
            return Err(JotterError::Config(format!(
                "debounce_ms {} exceeds the maximum of {}",
                self.debounce_ms, MAX_DEBOUNCE_MS
            )));
        }
        if self.index_key.is_empty() {
            return Err(JotterError::Config("index_key must not be empty".to_string()));
        }
        if self.record_prefix.is_empty() {
            return Err(JotterError::Config(
                "record_prefix must not be empty".to_string(),
            ));
        }
        // A record key must never collide with the index key.
        if self.index_key.starts_with(&self.record_prefix) {
            return Err(JotterError::Config(format!(
                "index_key '{}' overlaps record_prefix '{}'",
                self.index_key, self.record_prefix
            )));
        }
        Ok(())
    }

    pub fn debounce_delay(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn record_key(&self, id: &uuid::Uuid) -> String {
        format!("{}{}", self.record_prefix, id)
    }
}
