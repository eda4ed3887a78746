//! Indicator configuration.
//!
//! Reads/writes JSON at `$XDG_CONFIG_HOME/peertray/config.json`
//! (falling back to `~/.config`). Unknown or corrupt content degrades
//! to defaults rather than failing startup.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors surfaced by config load/save.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("config serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// On-disk config format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default = "default_true")]
    notifications_enabled: bool,
    #[serde(default = "default_true")]
    label_enabled: bool,
}

fn default_true() -> bool {
    true
}

/// Indicator configuration.
#[derive(Debug, Clone)]
pub struct IndicatorConfig {
    /// Whether error popups may be shown.
    pub notifications_enabled: bool,
    /// Whether the peering label may be displayed.
    pub label_enabled: bool,
    pub(crate) file_path: PathBuf,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            notifications_enabled: true,
            label_enabled: true,
            file_path: config_file_path(),
        }
    }
}

impl IndicatorConfig {
    /// Loads configuration from the conventional path.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config_file_path())
    }

    /// Loads configuration from an explicit path.
    pub fn load_from(file_path: PathBuf) -> Result<Self, ConfigError> {
        let mut config = IndicatorConfig {
            file_path: file_path.clone(),
            ..Default::default()
        };

        if file_path.exists() {
            let content = std::fs::read_to_string(&file_path)?;
            if let Ok(file) = serde_json::from_str::<ConfigFile>(&content) {
                config.notifications_enabled = file.notifications_enabled;
                config.label_enabled = file.label_enabled;
            } else {
                tracing::warn!(
                    path = %file_path.display(),
                    "failed to parse indicator config, using defaults"
                );
            }
        }

        Ok(config)
    }

    /// Saves configuration to its backing file.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = ConfigFile {
            notifications_enabled: self.notifications_enabled,
            label_enabled: self.label_enabled,
        };
        let content = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.file_path, content)?;
        Ok(())
    }
}

fn config_file_path() -> PathBuf {
    let base = std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("peertray").join("config.json")
}
