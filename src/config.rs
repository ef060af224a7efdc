//! Shell settings
//!
//! Small TOML file for things that belong to this frontend rather than to
//! the emulator configuration document: where the data directory lives, poll
//! rates, the amiibo API and the external core command.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Level};

pub const APP_DIR: &str = "joyshell";
pub const SETTINGS_FILE: &str = "shell.toml";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown log level '{0}'")]
    InvalidLogLevel(String),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ShellSettings {
    /// Overrides the data directory holding `Config.json` and profiles
    pub base_path: Option<PathBuf>,
    pub capture_poll_interval_ms: u64,
    pub gamepad_poll_interval_ms: u64,
    pub amiibo_api_url: String,
    pub core_command: Option<PathBuf>,
    pub core_args: Vec<String>,
    pub log_level: String,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            base_path: None,
            capture_poll_interval_ms: 10,
            gamepad_poll_interval_ms: 4,
            amiibo_api_url: "https://www.amiiboapi.com/api/".to_string(),
            core_command: None,
            core_args: Vec::new(),
            log_level: "info".to_string(),
        }
    }
}

impl ShellSettings {
    pub fn default_path() -> PathBuf {
        app_dir().join(SETTINGS_FILE)
    }

    /// Reads the settings file. A missing file yields the defaults.
    pub async fn load(path: &Path) -> Result<Self, SettingsError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| SettingsError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if !exists {
            debug!("No shell settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| SettingsError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
        let settings: Self = toml::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!("Loaded shell settings from {}", path.display());
        Ok(settings)
    }

    pub fn base_dir(&self) -> PathBuf {
        self.base_path.clone().unwrap_or_else(app_dir)
    }

    pub fn level(&self) -> Result<Level, SettingsError> {
        Level::from_str(&self.log_level)
            .map_err(|_| SettingsError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn capture_poll_interval(&self) -> Duration {
        Duration::from_millis(self.capture_poll_interval_ms)
    }
}

fn app_dir() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join(APP_DIR),
        None => {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".").join(APP_DIR)
        }
    }
}
