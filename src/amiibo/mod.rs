//! # Amiibo Module
//!
//! Figurine catalog from the public amiibo API, cached in
//! `<base>/Amiibo.json`.
//!
//! The cache is trusted while the API's `lastUpdated` stamp is not newer than
//! the file's modification time, and whenever the API cannot be reached.
//! Without cache and network the catalog is empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::dispatch::{ShellMessage, UiDispatcher};

pub const AMIIBO_CACHE_FILE: &str = "Amiibo.json";

#[derive(Debug, thiserror::Error)]
pub enum AmiiboError {
    #[error("Amiibo API request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Amiibo cache IO error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Amiibo catalog is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("No tokio runtime available for the amiibo download")]
    NoRuntime(#[from] tokio::runtime::TryCurrentError),
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AmiiboEntry {
    pub character: String,
    pub head: String,
    pub tail: String,
    pub image: String,
    pub amiibo_series: String,
}

impl AmiiboEntry {
    pub fn id(&self) -> String {
        format!("{}{}", self.head, self.tail)
    }
}

#[derive(Deserialize, Serialize, Debug, Default)]
struct AmiiboDocument {
    amiibo: Vec<AmiiboEntry>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct LastUpdated {
    last_updated: NaiveDateTime,
}

pub fn parse_catalog(json: &str) -> Result<Vec<AmiiboEntry>, AmiiboError> {
    Ok(serde_json::from_str::<AmiiboDocument>(json)?.amiibo)
}

/// Distinct series in catalog order
pub fn series(entries: &[AmiiboEntry]) -> Vec<&str> {
    let mut series: Vec<&str> = Vec::new();
    for entry in entries {
        if !series.contains(&entry.amiibo_series.as_str()) {
            series.push(&entry.amiibo_series);
        }
    }
    series
}

pub fn characters<'a>(entries: &'a [AmiiboEntry], series: &str) -> Vec<&'a AmiiboEntry> {
    entries
        .iter()
        .filter(|entry| entry.amiibo_series == series)
        .collect()
}

/// The remote stamp is naive and read as local time.
pub fn cache_is_fresh(last_updated: NaiveDateTime, cache_modified: DateTime<Local>) -> bool {
    match Local.from_local_datetime(&last_updated).earliest() {
        Some(remote) => remote <= cache_modified,
        None => false,
    }
}

#[derive(Debug, Clone)]
pub struct AmiiboClient {
    http: reqwest::Client,
    api_url: String,
}

impl AmiiboClient {
    pub fn new(api_url: &str) -> Self {
        let mut api_url = api_url.to_string();
        if !api_url.ends_with('/') {
            api_url.push('/');
        }
        Self {
            http: reqwest::Client::new(),
            api_url,
        }
    }

    async fn last_updated(&self) -> Result<NaiveDateTime, AmiiboError> {
        let stamp: LastUpdated = self
            .http
            .get(format!("{}lastupdated/", self.api_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(stamp.last_updated)
    }

    async fn download(&self) -> Result<String, AmiiboError> {
        let body = self
            .http
            .get(format!("{}amiibo/", self.api_url))
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }

    /// Returns the catalog, refreshing `cache` from the API when it is stale.
    pub async fn load_catalog(&self, cache: &Path) -> Vec<AmiiboEntry> {
        let cached = read_cache(cache);

        if let Some((entries, modified)) = &cached {
            match self.last_updated().await {
                Ok(stamp) if cache_is_fresh(stamp, *modified) => {
                    debug!("Amiibo cache is up to date");
                    return entries.clone();
                }
                Ok(stamp) => info!("Amiibo catalog changed at {}, refreshing", stamp),
                Err(e) => {
                    warn!("Amiibo API unreachable, using cache: {}", e);
                    return entries.clone();
                }
            }
        }

        match self.refresh(cache).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to download amiibo catalog: {}", e);
                cached.map(|(entries, _)| entries).unwrap_or_default()
            }
        }
    }

    async fn refresh(&self, cache: &Path) -> Result<Vec<AmiiboEntry>, AmiiboError> {
        let body = self.download().await?;
        let entries = parse_catalog(&body)?;
        if let Err(source) = fs::write(cache, &body) {
            warn!(
                "{}",
                AmiiboError::Io {
                    path: cache.to_path_buf(),
                    source
                }
            );
        }
        info!("Downloaded {} amiibo", entries.len());
        Ok(entries)
    }
}

fn read_cache(path: &Path) -> Option<(Vec<AmiiboEntry>, DateTime<Local>)> {
    let modified = fs::metadata(path).and_then(|meta| meta.modified()).ok()?;
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("Cannot read amiibo cache {}: {}", path.display(), e);
            return None;
        }
    };
    match parse_catalog(&content) {
        Ok(entries) => Some((entries, DateTime::<Local>::from(modified))),
        Err(e) => {
            warn!("Ignoring amiibo cache {}: {}", path.display(), e);
            None
        }
    }
}

/// Loads the catalog in the background and posts it to the UI.
pub fn spawn_load(
    client: AmiiboClient,
    cache: PathBuf,
    dispatcher: UiDispatcher,
) -> Result<JoinHandle<()>, AmiiboError> {
    let runtime = tokio::runtime::Handle::try_current()?;
    Ok(runtime.spawn(async move {
        let entries = client.load_catalog(&cache).await;
        dispatcher.post(ShellMessage::AmiiboLoaded(entries));
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    const UNREACHABLE: &str = "http://127.0.0.1:9/api";

    const CATALOG: &str = r#"{ "amiibo": [
        { "character": "Mario", "head": "00000000", "tail": "00340102",
          "image": "https://img/mario.png", "amiiboSeries": "Super Mario Bros.", "type": "Figure" },
        { "character": "Link", "head": "01000000", "tail": "00040002",
          "image": "https://img/link.png", "amiiboSeries": "Legend Of Zelda" },
        { "character": "Luigi", "head": "00010000", "tail": "00350102",
          "image": "https://img/luigi.png", "amiiboSeries": "Super Mario Bros." }
    ] }"#;

    #[test]
    fn series_are_distinct_in_order() {
        let entries = parse_catalog(CATALOG).unwrap();
        assert_eq!(series(&entries), ["Super Mario Bros.", "Legend Of Zelda"]);

        let mario = characters(&entries, "Super Mario Bros.");
        assert_eq!(mario.len(), 2);
        assert_eq!(mario[1].character, "Luigi");
        assert_eq!(mario[0].id(), "0000000000340102");
    }

    #[test]
    fn last_updated_stamp_parses() {
        let stamp: LastUpdated =
            serde_json::from_str(r#"{ "lastUpdated": "2020-04-01T12:30:45.123456" }"#).unwrap();
        assert_eq!(stamp.last_updated.to_string(), "2020-04-01 12:30:45.123456");
    }

    #[test]
    fn freshness_compares_against_modification_time() {
        let modified = Local::now();
        let older = (modified - Duration::hours(1)).naive_local();
        let newer = (modified + Duration::hours(1)).naive_local();
        assert!(cache_is_fresh(older, modified));
        assert!(!cache_is_fresh(newer, modified));
    }

    #[tokio::test]
    async fn offline_uses_cache() {
        let tmp = tempdir().unwrap();
        let cache = tmp.path().join(AMIIBO_CACHE_FILE);
        fs::write(&cache, CATALOG).unwrap();

        let entries = AmiiboClient::new(UNREACHABLE).load_catalog(&cache).await;
        assert_eq!(entries.len(), 3);
    }

    #[tokio::test]
    async fn offline_without_cache_is_empty() {
        let tmp = tempdir().unwrap();
        let cache = tmp.path().join(AMIIBO_CACHE_FILE);

        let (dispatcher, mut inbox) = UiDispatcher::channel();
        spawn_load(AmiiboClient::new(UNREACHABLE), cache.clone(), dispatcher)
            .unwrap()
            .await
            .unwrap();

        match inbox.recv().await {
            Some(ShellMessage::AmiiboLoaded(entries)) => assert!(entries.is_empty()),
            other => panic!("unexpected {:?}", other),
        }
        assert!(!cache.exists());
    }
}
