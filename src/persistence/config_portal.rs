//! # Configuration Portal
//!
//! Owns the single in-memory [`Configuration`] document and its location on
//! disk. The portal is created once in `main` and handed to the UI, which is
//! the only writer; every change is followed by [`ConfigPortal::save`].
//!
//! ## Resolution
//! A `Config.json` next to the executable wins over the global
//! `<base>/Config.json`. When neither exists the defaults are written to the
//! global location. A document that fails to parse is replaced by the
//! defaults in memory and logged; the broken file is only overwritten on the
//! next save.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use super::{ColumnSort, Configuration};
use crate::hid::{ControllerType, InputConfig, PlayerIndex};

pub const CONFIG_FILE_NAME: &str = "Config.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Configuration {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[source] serde_json::Error),
}

#[derive(Debug)]
pub struct ConfigPortal {
    path: PathBuf,
    config: Configuration,
}

impl ConfigPortal {
    pub fn new(path: PathBuf, config: Configuration) -> Self {
        Self { path, config }
    }

    /// Resolves the document for the data directory `base`.
    pub fn open(base: &Path) -> Result<Self, ConfigError> {
        let local = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)));
        Self::load_or_create(local, base.join(CONFIG_FILE_NAME))
    }

    pub fn load_or_create(local: Option<PathBuf>, global: PathBuf) -> Result<Self, ConfigError> {
        if let Some(local) = local.filter(|path| path.is_file()) {
            info!("Using local configuration {}", local.display());
            return Ok(Self::load_or_default(local));
        }

        if global.is_file() {
            info!("Using global configuration {}", global.display());
            return Ok(Self::load_or_default(global));
        }

        info!(
            "No configuration found, writing defaults to {}",
            global.display()
        );
        let portal = Self::new(global, Configuration::default());
        portal.save()?;
        Ok(portal)
    }

    fn load_or_default(path: PathBuf) -> Self {
        match Self::load(&path) {
            Ok(config) => Self::new(path, config),
            Err(e) => {
                error!("{}", e);
                warn!("Falling back to default configuration");
                Self::new(path, Configuration::default())
            }
        }
    }

    pub fn load(path: &Path) -> Result<Configuration, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.config).map_err(ConfigError::Serialize)?;
        fs::write(&self.path, json).map_err(|source| ConfigError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("Configuration saved to {}", self.path.display());
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Configuration {
        &mut self.config
    }

    /// Replaces the whole document, as done by the settings window.
    pub fn replace(&mut self, config: Configuration) {
        self.config = config;
    }

    pub fn input_config(&self, player: PlayerIndex) -> Option<&InputConfig> {
        self.config
            .hid
            .input_config
            .iter()
            .find(|config| config.player_index() == player)
    }

    pub fn input_configs_mut(&mut self) -> &mut Vec<InputConfig> {
        &mut self.config.hid.input_config
    }

    /// `(player, controller type)` pairs handed to the emulation core
    pub fn controller_assignments(&self) -> Vec<(PlayerIndex, ControllerType)> {
        self.config
            .hid
            .input_config
            .iter()
            .map(|config| (config.player_index(), config.controller_type()))
            .collect()
    }

    pub fn set_column_sort(&mut self, sort: ColumnSort) {
        self.config.ui.column_sort = sort;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::{ControllerConfig, KeyboardConfig};
    use tempfile::tempdir;

    #[test]
    fn missing_documents_write_defaults_globally() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join("data").join(CONFIG_FILE_NAME);

        let portal = ConfigPortal::load_or_create(None, global.clone()).unwrap();
        assert_eq!(portal.path(), global.as_path());
        assert!(global.is_file());
        assert_eq!(portal.config().hid.input_config.len(), 1);
        assert_eq!(
            portal.input_config(PlayerIndex::Player1),
            Some(&InputConfig::Keyboard(KeyboardConfig::default_profile()))
        );
    }

    #[test]
    fn local_document_wins() {
        let tmp = tempdir().unwrap();
        let local = tmp.path().join("local.json");
        let global = tmp.path().join("global.json");

        let mut config = Configuration::default();
        config.system.enable_docked_mode = true;
        fs::write(&local, serde_json::to_string(&config).unwrap()).unwrap();
        fs::write(&global, serde_json::to_string(&Configuration::default()).unwrap()).unwrap();

        let portal = ConfigPortal::load_or_create(Some(local.clone()), global).unwrap();
        assert_eq!(portal.path(), local.as_path());
        assert!(portal.config().system.enable_docked_mode);
    }

    #[test]
    fn partial_document_fills_defaults() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&global, r#"{ "graphics": { "res_scale": 2 } }"#).unwrap();

        let portal = ConfigPortal::load_or_create(None, global).unwrap();
        assert_eq!(portal.config().graphics.res_scale, 2);
        assert!(portal.config().graphics.enable_vsync);
        assert!(portal.config().ui.gui_columns.application);
    }

    #[test]
    fn malformed_document_falls_back_to_defaults() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join(CONFIG_FILE_NAME);
        fs::write(&global, "not json").unwrap();

        let portal = ConfigPortal::load_or_create(None, global.clone()).unwrap();
        assert_eq!(portal.config().version, Configuration::default().version);
        assert_eq!(fs::read_to_string(global).unwrap(), "not json");
    }

    #[test]
    fn save_round_trips_and_lists_assignments() {
        let tmp = tempdir().unwrap();
        let global = tmp.path().join(CONFIG_FILE_NAME);
        let mut portal = ConfigPortal::load_or_create(None, global.clone()).unwrap();

        let mut pad = ControllerConfig::default_profile();
        pad.player_index = PlayerIndex::Player2;
        pad.controller_type = ControllerType::JoyconLeft;
        portal.input_configs_mut().push(InputConfig::Controller(pad));
        portal.save().unwrap();

        let reloaded = ConfigPortal::load(&global).unwrap();
        assert_eq!(reloaded.hid.input_config.len(), 2);
        assert_eq!(
            portal.controller_assignments(),
            vec![
                (PlayerIndex::Player1, ControllerType::JoyconPair),
                (PlayerIndex::Player2, ControllerType::JoyconLeft),
            ]
        );
    }
}
