//! Named input profiles on disk
//!
//! Layout: `<base>/profiles/{keyboard|controller}/<name>.json`, one tagged
//! [`InputConfig`] per file, pretty printed. The `Default` entry of every
//! device class is never file backed.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::hid::{ControllerConfig, InputConfig, KeyboardConfig};

const PROFILE_DIR: &str = "profiles";
const PROFILE_EXTENSION: &str = "json";
const INVALID_NAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Keyboard,
    Controller,
}

impl DeviceClass {
    pub fn dir_name(&self) -> &'static str {
        match self {
            DeviceClass::Keyboard => "keyboard",
            DeviceClass::Controller => "controller",
        }
    }

    pub fn of(config: &InputConfig) -> Self {
        match config {
            InputConfig::Keyboard(_) => DeviceClass::Keyboard,
            InputConfig::Controller(_) => DeviceClass::Controller,
        }
    }

    pub fn default_profile(&self) -> InputConfig {
        match self {
            DeviceClass::Keyboard => InputConfig::Keyboard(KeyboardConfig::default_profile()),
            DeviceClass::Controller => {
                InputConfig::Controller(ControllerConfig::default_profile())
            }
        }
    }
}

/// One row of the profile selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileEntry {
    Default,
    Named { name: String, file_name: String },
}

impl ProfileEntry {
    pub fn is_default(&self) -> bool {
        matches!(self, ProfileEntry::Default)
    }
}

impl fmt::Display for ProfileEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProfileEntry::Default => write!(f, "Default"),
            ProfileEntry::Named { name, .. } => write!(f, "{}", name),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("Invalid profile name '{0}'")]
    InvalidName(String),

    #[error("Profile file {0} no longer exists")]
    Missing(PathBuf),

    #[error("Profile file {path} is not a valid input configuration: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Profile {name} holds a {found:?} configuration, expected {expected:?}")]
    WrongClass {
        name: String,
        expected: DeviceClass,
        found: DeviceClass,
    },

    #[error("The default profile cannot be deleted")]
    DefaultIsReadOnly,

    #[error("Profile IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to serialize profile: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Rejects empty names, reserved path characters and control characters.
pub fn validate_profile_name(name: &str) -> Result<(), ProfileError> {
    let trimmed = name.trim();
    if trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || name
            .chars()
            .any(|c| c.is_control() || INVALID_NAME_CHARS.contains(&c))
    {
        return Err(ProfileError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ProfileStore {
    base: PathBuf,
}

impl ProfileStore {
    /// `base` is the application data directory; profiles live below
    /// `<base>/profiles`.
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn dir(&self, class: DeviceClass) -> PathBuf {
        self.base.join(PROFILE_DIR).join(class.dir_name())
    }

    fn ensure_dir(&self, class: DeviceClass) -> Result<PathBuf, ProfileError> {
        let dir = self.dir(class);
        if !dir.exists() {
            debug!("Creating profile directory {}", dir.display());
            fs::create_dir_all(&dir)?;
        }
        Ok(dir)
    }

    /// `Default` first, then the stored profiles sorted by name.
    pub fn list(&self, class: DeviceClass) -> Result<Vec<ProfileEntry>, ProfileError> {
        let dir = self.ensure_dir(class)?;

        let mut named = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            if !path.is_file() || !has_profile_extension(&path) {
                continue;
            }
            let (Some(stem), Some(file_name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) else {
                warn!("Skipping profile with non UTF-8 name: {}", path.display());
                continue;
            };
            named.push(ProfileEntry::Named {
                name: stem.to_string(),
                file_name: file_name.to_string(),
            });
        }
        named.sort_by(|a, b| a.to_string().cmp(&b.to_string()));

        let mut entries = Vec::with_capacity(named.len() + 1);
        entries.push(ProfileEntry::Default);
        entries.extend(named);
        Ok(entries)
    }

    pub fn load(&self, class: DeviceClass, entry: &ProfileEntry) -> Result<InputConfig, ProfileError> {
        let (name, file_name) = match entry {
            ProfileEntry::Default => return Ok(class.default_profile()),
            ProfileEntry::Named { name, file_name } => (name, file_name),
        };

        let path = self.dir(class).join(file_name);
        if !path.exists() {
            return Err(ProfileError::Missing(path));
        }

        let content = fs::read_to_string(&path)?;
        let config: InputConfig = serde_json::from_str(&content)
            .map_err(|source| ProfileError::Malformed { path: path.clone(), source })?;

        let found = DeviceClass::of(&config);
        if found != class {
            return Err(ProfileError::WrongClass {
                name: name.clone(),
                expected: class,
                found,
            });
        }

        debug!("Loaded profile {} from {}", name, path.display());
        Ok(config)
    }

    /// Writes `config` as `<name>.json` into the directory of its device class,
    /// replacing any existing profile of that name.
    pub fn save(&self, name: &str, config: &InputConfig) -> Result<ProfileEntry, ProfileError> {
        validate_profile_name(name)?;
        let class = DeviceClass::of(config);
        let dir = self.ensure_dir(class)?;

        let file_name = format!("{}.{}", name, PROFILE_EXTENSION);
        let path = dir.join(&file_name);
        let json = serde_json::to_string_pretty(config).map_err(ProfileError::Serialize)?;
        fs::write(&path, json)?;

        info!("Saved {} profile {}", class.dir_name(), path.display());
        Ok(ProfileEntry::Named {
            name: name.to_string(),
            file_name,
        })
    }

    pub fn delete(&self, class: DeviceClass, entry: &ProfileEntry) -> Result<(), ProfileError> {
        let ProfileEntry::Named { file_name, .. } = entry else {
            return Err(ProfileError::DefaultIsReadOnly);
        };

        let path = self.dir(class).join(file_name);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted profile {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ProfileError::Missing(path)),
            Err(e) => Err(e.into()),
        }
    }
}

fn has_profile_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(PROFILE_EXTENSION))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hid::ControllerInputId;
    use tempfile::tempdir;

    fn named(name: &str) -> ProfileEntry {
        ProfileEntry::Named {
            name: name.to_string(),
            file_name: format!("{}.json", name),
        }
    }

    #[test]
    fn list_starts_with_default_and_creates_dir() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());

        let entries = store.list(DeviceClass::Keyboard).unwrap();
        assert_eq!(entries, vec![ProfileEntry::Default]);
        assert!(tmp.path().join("profiles/keyboard").is_dir());
    }

    #[test]
    fn save_controller_profile_round_trips() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());

        let mut controller = ControllerConfig::default_profile();
        controller.deadzone_left = 0.25;
        controller.right_joycon.button_a = ControllerInputId::Button(7);
        let config = InputConfig::Controller(controller);

        let entry = store.save("My Config", &config).unwrap();
        let path = tmp.path().join("profiles/controller/My Config.json");
        assert!(path.is_file());

        let loaded = store.load(DeviceClass::Controller, &entry).unwrap();
        assert_eq!(loaded, config);

        let entries = store.list(DeviceClass::Controller).unwrap();
        assert_eq!(entries, vec![ProfileEntry::Default, named("My Config")]);
    }

    #[test]
    fn saved_file_is_pretty_tagged_json() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let config = InputConfig::Keyboard(KeyboardConfig::default_profile());

        store.save("kb", &config).unwrap();
        let text = fs::read_to_string(tmp.path().join("profiles/keyboard/kb.json")).unwrap();
        assert!(text.contains('\n'));
        assert!(text.contains("\"type\": \"keyboard\""));
    }

    #[test]
    fn list_is_sorted_and_ignores_other_files() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let config = InputConfig::Keyboard(KeyboardConfig::default_profile());
        store.save("zeta", &config).unwrap();
        store.save("alpha", &config).unwrap();
        fs::write(store.dir(DeviceClass::Keyboard).join("notes.txt"), "x").unwrap();

        let entries = store.list(DeviceClass::Keyboard).unwrap();
        assert_eq!(entries, vec![ProfileEntry::Default, named("alpha"), named("zeta")]);
    }

    #[test]
    fn invalid_names_write_nothing() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let config = InputConfig::Keyboard(KeyboardConfig::default_profile());

        for bad in ["a/b", "", "   ", "what?", "tab\there", "..", "pipe|name"] {
            assert!(matches!(
                store.save(bad, &config),
                Err(ProfileError::InvalidName(_))
            ));
        }
        assert_eq!(store.list(DeviceClass::Keyboard).unwrap().len(), 1);
    }

    #[test]
    fn default_entry_yields_class_defaults() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());

        assert_eq!(
            store.load(DeviceClass::Keyboard, &ProfileEntry::Default).unwrap(),
            InputConfig::Keyboard(KeyboardConfig::default_profile())
        );
        assert_eq!(
            store.load(DeviceClass::Controller, &ProfileEntry::Default).unwrap(),
            InputConfig::Controller(ControllerConfig::default_profile())
        );
    }

    #[test]
    fn stale_entry_reports_missing() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());

        assert!(matches!(
            store.load(DeviceClass::Keyboard, &named("gone")),
            Err(ProfileError::Missing(_))
        ));
    }

    #[test]
    fn garbage_reports_malformed() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let dir = store.dir(DeviceClass::Controller);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("broken.json"), "{ \"deadzone_left\": 0.1 }").unwrap();

        assert!(matches!(
            store.load(DeviceClass::Controller, &named("broken")),
            Err(ProfileError::Malformed { .. })
        ));
    }

    #[test]
    fn keyboard_profile_in_controller_dir_is_rejected() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let dir = store.dir(DeviceClass::Controller);
        fs::create_dir_all(&dir).unwrap();
        let keyboard = InputConfig::Keyboard(KeyboardConfig::default_profile());
        fs::write(dir.join("kb.json"), serde_json::to_string(&keyboard).unwrap()).unwrap();

        assert!(matches!(
            store.load(DeviceClass::Controller, &named("kb")),
            Err(ProfileError::WrongClass { .. })
        ));
    }

    #[test]
    fn delete_removes_file_and_refuses_default() {
        let tmp = tempdir().unwrap();
        let store = ProfileStore::new(tmp.path());
        let config = InputConfig::Keyboard(KeyboardConfig::default_profile());
        let entry = store.save("temp", &config).unwrap();

        store.delete(DeviceClass::Keyboard, &entry).unwrap();
        assert_eq!(store.list(DeviceClass::Keyboard).unwrap(), vec![ProfileEntry::Default]);

        assert!(matches!(
            store.delete(DeviceClass::Keyboard, &ProfileEntry::Default),
            Err(ProfileError::DefaultIsReadOnly)
        ));
    }
}
