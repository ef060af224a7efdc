//! Per-title metadata kept in `<base>/games/metadata.json`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::LibraryError;

pub const METADATA_FILE_NAME: &str = "metadata.json";

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct GameMetadata {
    pub favorite: bool,
    pub time_played_secs: u64,
    pub last_played: Option<DateTime<Local>>,
}

impl GameMetadata {
    pub fn time_played(&self) -> Duration {
        Duration::from_secs(self.time_played_secs)
    }
}

#[derive(Debug, Clone)]
pub struct MetadataStore {
    path: PathBuf,
    entries: BTreeMap<PathBuf, GameMetadata>,
}

impl MetadataStore {
    /// Loads the store of the data directory `base`. A missing or broken
    /// file starts an empty store.
    pub fn open(base: &Path) -> Self {
        let path = base.join("games").join(METADATA_FILE_NAME);
        let entries = match Self::read(&path) {
            Ok(entries) => entries,
            Err(LibraryError::Io { source, .. })
                if source.kind() == std::io::ErrorKind::NotFound =>
            {
                debug!("No game metadata at {}", path.display());
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Ignoring game metadata: {}", e);
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    fn read(path: &Path) -> Result<BTreeMap<PathBuf, GameMetadata>, LibraryError> {
        let content = fs::read_to_string(path).map_err(|source| LibraryError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| LibraryError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self) -> Result<(), LibraryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| LibraryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(&self.entries).map_err(LibraryError::Serialize)?;
        fs::write(&self.path, json).map_err(|source| LibraryError::Io {
            path: self.path.clone(),
            source,
        })
    }

    pub fn get(&self, title: &Path) -> GameMetadata {
        self.entries.get(title).cloned().unwrap_or_default()
    }

    /// Copy handed to the background scan
    pub fn snapshot(&self) -> BTreeMap<PathBuf, GameMetadata> {
        self.entries.clone()
    }

    fn update(
        &mut self,
        title: &Path,
        change: impl FnOnce(&mut GameMetadata),
    ) -> Result<GameMetadata, LibraryError> {
        let entry = self.entries.entry(title.to_path_buf()).or_default();
        change(entry);
        let updated = entry.clone();
        self.save()?;
        Ok(updated)
    }

    pub fn set_favorite(&mut self, title: &Path, favorite: bool) -> Result<GameMetadata, LibraryError> {
        self.update(title, |meta| meta.favorite = favorite)
    }

    pub fn record_start(
        &mut self,
        title: &Path,
        at: DateTime<Local>,
    ) -> Result<GameMetadata, LibraryError> {
        self.update(title, |meta| meta.last_played = Some(at))
    }

    /// Adds a finished session, rounded to whole seconds.
    pub fn record_session(
        &mut self,
        title: &Path,
        played: Duration,
    ) -> Result<GameMetadata, LibraryError> {
        let secs = played.as_secs_f64().round() as u64;
        self.update(title, |meta| meta.time_played_secs += secs)
    }
}
