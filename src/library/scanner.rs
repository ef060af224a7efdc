//! Recursive game directory scan
//!
//! Walking large directory trees blocks, so [`spawn_scan`] runs
//! [`scan_dirs`] on tokio's blocking pool and posts the result as
//! [`ShellMessage::LibraryLoaded`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use super::metadata::GameMetadata;
use super::{GameEntry, LibraryError};
use crate::dispatch::{ShellMessage, UiDispatcher};

pub const GAME_EXTENSIONS: [&str; 6] = ["xci", "nca", "nsp", "pfs0", "nro", "nso"];

fn game_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_lowercase();
    GAME_EXTENSIONS
        .contains(&extension.as_str())
        .then_some(extension)
}

pub fn scan_dirs(dirs: &[PathBuf], metadata: &BTreeMap<PathBuf, GameMetadata>) -> Vec<GameEntry> {
    let mut entries = Vec::new();

    for dir in dirs {
        if !dir.is_dir() {
            warn!("Game directory {} does not exist, skipping", dir.display());
            continue;
        }

        for item in WalkDir::new(dir).follow_links(true) {
            let item = match item {
                Ok(item) => item,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !item.file_type().is_file() {
                continue;
            }
            let path = item.path();
            let Some(extension) = game_extension(path) else {
                continue;
            };

            let size = match item.metadata() {
                Ok(meta) => meta.len(),
                Err(e) => {
                    warn!("Cannot stat {}: {}", path.display(), e);
                    continue;
                }
            };
            let meta = metadata.get(path).cloned().unwrap_or_default();
            entries.push(GameEntry {
                title: path
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                path: path.to_path_buf(),
                extension,
                size,
                favorite: meta.favorite,
                time_played: meta.time_played(),
                last_played: meta.last_played,
            });
        }
    }

    entries
}

/// Scans `dirs` in the background and posts the entries to the UI.
pub fn spawn_scan(
    dirs: Vec<PathBuf>,
    metadata: BTreeMap<PathBuf, GameMetadata>,
    dispatcher: UiDispatcher,
) -> Result<JoinHandle<()>, LibraryError> {
    let runtime = tokio::runtime::Handle::try_current()?;
    info!("Scanning {} game directories", dirs.len());

    Ok(runtime.spawn_blocking(move || {
        let entries = scan_dirs(&dirs, &metadata);
        info!("Found {} titles", entries.len());
        dispatcher.post(ShellMessage::LibraryLoaded(entries));
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::tempdir;

    #[test]
    fn finds_games_recursively_and_skips_missing_dirs() {
        let tmp = tempdir().unwrap();
        let nested = tmp.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(tmp.path().join("One.NSP"), [0u8; 16]).unwrap();
        fs::write(nested.join("two.xci"), [0u8; 4]).unwrap();
        fs::write(nested.join("notes.txt"), "x").unwrap();

        let mut metadata = BTreeMap::new();
        metadata.insert(
            nested.join("two.xci"),
            GameMetadata {
                favorite: true,
                time_played_secs: 30,
                last_played: None,
            },
        );

        let dirs = vec![tmp.path().join("missing"), tmp.path().to_path_buf()];
        let mut entries = scan_dirs(&dirs, &metadata);
        entries.sort_by(|a, b| a.title.cmp(&b.title));

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].title, "One");
        assert_eq!(entries[0].extension, "nsp");
        assert_eq!(entries[0].size, 16);
        assert!(!entries[0].favorite);
        assert_eq!(entries[1].title, "two");
        assert!(entries[1].favorite);
        assert_eq!(entries[1].time_played, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn background_scan_posts_result() {
        let tmp = tempdir().unwrap();
        fs::write(tmp.path().join("game.nro"), "").unwrap();
        let (dispatcher, mut inbox) = UiDispatcher::channel();

        let handle =
            spawn_scan(vec![tmp.path().to_path_buf()], BTreeMap::new(), dispatcher).unwrap();
        handle.await.unwrap();

        match inbox.recv().await {
            Some(ShellMessage::LibraryLoaded(entries)) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].extension, "nro");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
