//! # Library Module
//!
//! The game table model: entries found by the [`scanner`], their per-title
//! [`metadata`] and how a selected title is started through [`launch`].

pub mod launch;
pub mod metadata;
pub mod scanner;

use std::cmp::Ordering;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::persistence::{ColumnSort, SortColumn};

pub use launch::{CommandCore, EmulationCore, LaunchError, LaunchRequest, LoadKind};
pub use metadata::{GameMetadata, MetadataStore};
pub use scanner::{scan_dirs, spawn_scan, GAME_EXTENSIONS};

const SECS_PER_MIN: u64 = 60;
const SECS_PER_HOUR: u64 = 60 * SECS_PER_MIN;
const SECS_PER_DAY: u64 = 24 * SECS_PER_HOUR;
const MIB: u64 = 1024 * 1024;
const GIB: u64 = 1024 * MIB;

#[derive(Debug, thiserror::Error)]
pub enum LibraryError {
    #[error("Library IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Metadata {path} is malformed: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to serialize metadata: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("No tokio runtime available for the library scan")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

/// One row of the game table
#[derive(Debug, Clone, PartialEq)]
pub struct GameEntry {
    pub title: String,
    pub path: PathBuf,
    /// Lowercase, without the dot
    pub extension: String,
    pub size: u64,
    pub favorite: bool,
    pub time_played: Duration,
    pub last_played: Option<DateTime<Local>>,
}

impl GameEntry {
    pub fn time_played_label(&self) -> String {
        format_time_played(self.time_played)
    }

    pub fn last_played_label(&self) -> String {
        format_last_played(self.last_played)
    }

    pub fn size_label(&self) -> String {
        format_size(self.size)
    }

    pub fn cell(&self, column: SortColumn) -> String {
        match column {
            SortColumn::Favorite => if self.favorite { "★" } else { "" }.to_string(),
            SortColumn::Application => self.title.clone(),
            SortColumn::TimePlayed => self.time_played_label(),
            SortColumn::LastPlayed => self.last_played_label(),
            SortColumn::FileExt => self.extension.to_uppercase(),
            SortColumn::FileSize => self.size_label(),
            SortColumn::Path => self.path.display().to_string(),
        }
    }
}

pub fn format_time_played(played: Duration) -> String {
    let secs = played.as_secs();
    if secs < SECS_PER_MIN {
        format!("{}s", secs)
    } else if secs < SECS_PER_HOUR {
        format!("{:.2} mins", secs as f64 / SECS_PER_MIN as f64)
    } else if secs < SECS_PER_DAY {
        format!("{:.2} hrs", secs as f64 / SECS_PER_HOUR as f64)
    } else {
        format!("{:.2} days", secs as f64 / SECS_PER_DAY as f64)
    }
}

pub fn format_last_played(last_played: Option<DateTime<Local>>) -> String {
    match last_played {
        Some(at) => at.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "Never".to_string(),
    }
}

pub fn format_size(bytes: u64) -> String {
    if bytes >= GIB {
        format!("{:.2}GB", bytes as f64 / GIB as f64)
    } else {
        format!("{:.2}MB", bytes as f64 / MIB as f64)
    }
}

/// Order of two entries for `column` in its ascending direction.
///
/// Time played, last played and size put the larger value first, so the
/// ascending header arrow lists the most played, most recent and biggest
/// titles at the top.
pub fn compare(column: SortColumn, a: &GameEntry, b: &GameEntry) -> Ordering {
    match column {
        SortColumn::Favorite => a.favorite.cmp(&b.favorite),
        SortColumn::Application => caseless(&a.title, &b.title),
        SortColumn::TimePlayed => b.time_played.cmp(&a.time_played),
        SortColumn::LastPlayed => b.last_played.cmp(&a.last_played),
        SortColumn::FileExt => caseless(&a.extension, &b.extension),
        SortColumn::FileSize => b.size.cmp(&a.size),
        SortColumn::Path => caseless(&a.path.to_string_lossy(), &b.path.to_string_lossy()),
    }
}

fn caseless(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

pub fn sort_entries(entries: &mut [GameEntry], sort: ColumnSort) {
    entries.sort_by(|a, b| {
        let ordering = compare(sort.column, a, b);
        if sort.ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
}
