//! # Persistence Module
//!
//! Data model of the global configuration document plus the two stores that
//! touch the disk:
//!
//! - [`config_portal`]: the owned [`Configuration`] document (`Config.json`)
//! - [`profile_store`]: named input profiles per device class
//!
//! Every section uses `#[serde(default)]` so documents written by older or
//! newer builds load with missing fields filled in.

pub mod config_portal;
pub mod profile_store;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::hid::{InputConfig, KeyboardConfig};

pub use config_portal::{ConfigError, ConfigPortal};
pub use profile_store::{DeviceClass, ProfileEntry, ProfileError, ProfileStore};

pub const CONFIG_VERSION: u32 = 1;

/// Root of `Config.json`
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct Configuration {
    pub version: u32,
    pub logger: LoggerConfig,
    pub system: SystemConfig,
    pub graphics: GraphicsConfig,
    pub ui: UiConfig,
    pub hid: HidConfig,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            logger: LoggerConfig::default(),
            system: SystemConfig::default(),
            graphics: GraphicsConfig::default(),
            ui: UiConfig::default(),
            hid: HidConfig::default(),
        }
    }
}

/// Log channels forwarded to the emulation core
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct LoggerConfig {
    pub enable_file_log: bool,
    pub enable_debug: bool,
    pub enable_stub: bool,
    pub enable_info: bool,
    pub enable_warn: bool,
    pub enable_error: bool,
    pub enable_guest: bool,
    pub enable_fs_access_log: bool,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            enable_file_log: true,
            enable_debug: false,
            enable_stub: true,
            enable_info: true,
            enable_warn: true,
            enable_error: true,
            enable_guest: true,
            enable_fs_access_log: false,
        }
    }
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default, EnumIter, Display, EnumString,
)]
pub enum SystemLanguage {
    Japanese,
    #[default]
    AmericanEnglish,
    French,
    German,
    Italian,
    Spanish,
    Chinese,
    Korean,
    Dutch,
    Portuguese,
    Russian,
    Taiwanese,
    BritishEnglish,
    CanadianFrench,
    LatinAmericanSpanish,
    SimplifiedChinese,
    TraditionalChinese,
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default, EnumIter, Display, EnumString,
)]
pub enum Region {
    Japan,
    #[default]
    USA,
    Europe,
    Australia,
    China,
    Korea,
    Taiwan,
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default, EnumIter, Display, EnumString,
)]
pub enum AudioBackend {
    Dummy,
    #[default]
    OpenAl,
    SoundIo,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    pub language: SystemLanguage,
    pub region: Region,
    pub time_zone: String,
    /// Seconds added to the host clock
    pub system_time_offset: i64,
    pub enable_docked_mode: bool,
    pub enable_multicore_scheduling: bool,
    pub enable_ptc: bool,
    pub enable_fs_integrity_checks: bool,
    pub ignore_missing_services: bool,
    pub audio_backend: AudioBackend,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            language: SystemLanguage::default(),
            region: Region::default(),
            time_zone: "UTC".to_string(),
            system_time_offset: 0,
            enable_docked_mode: false,
            enable_multicore_scheduling: true,
            enable_ptc: false,
            enable_fs_integrity_checks: true,
            ignore_missing_services: false,
            audio_backend: AudioBackend::default(),
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct GraphicsConfig {
    /// Integer scale, `-1` selects `res_scale_custom`
    pub res_scale: i32,
    pub res_scale_custom: f32,
    /// `-1.0` lets the game decide
    pub max_anisotropy: f32,
    pub shaders_dump_path: String,
    pub enable_vsync: bool,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            res_scale: 1,
            res_scale_custom: 1.0,
            max_anisotropy: -1.0,
            shaders_dump_path: String::new(),
            enable_vsync: true,
        }
    }
}

/// Visible columns of the game table
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GuiColumns {
    pub favorite: bool,
    pub application: bool,
    pub time_played: bool,
    pub last_played: bool,
    pub file_ext: bool,
    pub file_size: bool,
    pub path: bool,
}

impl Default for GuiColumns {
    fn default() -> Self {
        Self {
            favorite: true,
            application: true,
            time_played: true,
            last_played: true,
            file_ext: true,
            file_size: true,
            path: true,
        }
    }
}

impl GuiColumns {
    pub fn is_visible(&self, column: SortColumn) -> bool {
        match column {
            SortColumn::Favorite => self.favorite,
            SortColumn::Application => self.application,
            SortColumn::TimePlayed => self.time_played,
            SortColumn::LastPlayed => self.last_played,
            SortColumn::FileExt => self.file_ext,
            SortColumn::FileSize => self.file_size,
            SortColumn::Path => self.path,
        }
    }

    pub fn toggle(&mut self, column: SortColumn) {
        let flag = match column {
            SortColumn::Favorite => &mut self.favorite,
            SortColumn::Application => &mut self.application,
            SortColumn::TimePlayed => &mut self.time_played,
            SortColumn::LastPlayed => &mut self.last_played,
            SortColumn::FileExt => &mut self.file_ext,
            SortColumn::FileSize => &mut self.file_size,
            SortColumn::Path => &mut self.path,
        };
        *flag = !*flag;
    }
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default, EnumIter, Display,
)]
pub enum SortColumn {
    #[default]
    Favorite,
    Application,
    TimePlayed,
    LastPlayed,
    FileExt,
    FileSize,
    Path,
}

impl SortColumn {
    pub fn header(&self) -> &'static str {
        match self {
            SortColumn::Favorite => "Fav",
            SortColumn::Application => "Application",
            SortColumn::TimePlayed => "Time Played",
            SortColumn::LastPlayed => "Last Played",
            SortColumn::FileExt => "File Ext",
            SortColumn::FileSize => "File Size",
            SortColumn::Path => "Path",
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ColumnSort {
    pub column: SortColumn,
    pub ascending: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(default)]
pub struct UiConfig {
    pub game_dirs: Vec<PathBuf>,
    pub gui_columns: GuiColumns,
    pub column_sort: ColumnSort,
    pub enable_custom_theme: bool,
    pub custom_theme_path: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct HidConfig {
    pub enable_keyboard: bool,
    /// At most one entry per player slot
    pub input_config: Vec<InputConfig>,
}

impl Default for HidConfig {
    fn default() -> Self {
        Self {
            enable_keyboard: false,
            input_config: vec![InputConfig::Keyboard(KeyboardConfig::default_profile())],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn column_toggle_flips_only_that_column() {
        let mut columns = GuiColumns::default();
        columns.toggle(SortColumn::FileSize);

        for column in SortColumn::iter() {
            assert_eq!(columns.is_visible(column), column != SortColumn::FileSize);
        }
    }

    #[test]
    fn empty_document_is_default() {
        let config: Configuration = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn enums_serialize_by_name() {
        let value = serde_json::to_value(SystemConfig::default()).unwrap();
        assert_eq!(value["language"], "AmericanEnglish");
        assert_eq!(value["audio_backend"], "OpenAl");
    }
}
