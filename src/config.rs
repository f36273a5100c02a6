//! Engine configuration, loaded from `~/.calsync/config.json`.
//!
//! Every field carries a serde default so a partial (or absent) config file
//! still yields a working engine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineConfig {
    /// Width of the rolling window the periodic sync pulls, in hours.
    #[serde(default = "default_sync_window_hours")]
    pub sync_window_hours: i64,
    /// Debounce window for provider change notifications, in milliseconds.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Where selection preferences and the armed-alarm ledger live.
    /// Defaults to `~/.calsync`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state_dir: Option<PathBuf>,
}

fn default_sync_window_hours() -> i64 {
    24
}

fn default_debounce_ms() -> u64 {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sync_window_hours: default_sync_window_hours(),
            debounce_ms: default_debounce_ms(),
            state_dir: None,
        }
    }
}

impl EngineConfig {
    /// Load configuration from a JSON file. A missing file yields defaults;
    /// malformed JSON is an error (a corrupt config should be surfaced, not
    /// silently replaced).
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Resolve the state directory, creating it if needed.
    pub fn state_dir(&self) -> Result<PathBuf, StoreError> {
        let dir = match &self.state_dir {
            Some(dir) => dir.clone(),
            None => dirs::home_dir()
                .ok_or_else(|| {
                    StoreError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        "could not find home directory",
                    ))
                })?
                .join(".calsync"),
        };
        if !dir.exists() {
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }
}
