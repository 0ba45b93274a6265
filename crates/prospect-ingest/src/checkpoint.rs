//! Durable ingestion progress
//!
//! The checkpoint records the last page that was fetched and persisted, plus
//! the raw records of every page fetched so far. On disk it is a single JSON
//! object:
//!
//! ```json
//! { "latestPage": 2, "page1": [ { "name": "..." } ], "page2": [] }
//! ```
//!
//! The importer later reads the `page<N>` arrays back out of the same file.

use crate::error::{IngestError, IngestResult};
use crate::models::RawRecord;
use async_trait::async_trait;
use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, Mutex};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

const LATEST_PAGE_KEY: &str = "latestPage";

static PAGE_KEY: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^page(\d+)$").expect("page key pattern is valid")
});

/// Progress of a pagination run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointState {
    /// Highest page persisted so far, 0 before the first page
    pub latest_page: u32,
    /// Raw records per 1-based page number
    pub pages: BTreeMap<u32, Vec<RawRecord>>,
}

impl CheckpointState {
    /// Page the next run should fetch
    pub fn next_page(&self) -> u32 {
        self.latest_page.saturating_add(1)
    }

    /// Store the records of `page` and advance `latest_page`
    ///
    /// Writing a page number that already exists replaces its records.
    /// `latest_page` never moves backwards.
    pub fn record_page(&mut self, page: u32, records: Vec<RawRecord>) {
        self.pages.insert(page, records);
        self.latest_page = self.latest_page.max(page);
    }

    /// Total number of raw records across all pages
    pub fn record_count(&self) -> usize {
        self.pages.values().map(Vec::len).sum()
    }

    /// Parse the on-disk JSON representation
    ///
    /// Keys other than `latestPage` and `page<N>` are ignored.
    pub fn from_json(value: Value) -> Result<Self, String> {
        let Value::Object(object) = value else {
            return Err("checkpoint root must be a JSON object".to_string());
        };

        let latest_page = match object.get(LATEST_PAGE_KEY) {
            Some(value) => value
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .ok_or_else(|| {
                    format!("'{}' must be a non-negative integer, got {}", LATEST_PAGE_KEY, value)
                })?,
            None => return Err(format!("missing '{}'", LATEST_PAGE_KEY)),
        };

        let mut pages = BTreeMap::new();
        for (key, value) in object {
            let Some(captures) = PAGE_KEY.captures(&key) else {
                continue;
            };
            let digits = &captures[1];
            let page = digits
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0 && n.to_string() == digits)
                .ok_or_else(|| format!("'{}' is not a valid page key", key))?;

            let Value::Array(items) = value else {
                return Err(format!("'{}' must be an array of records", key));
            };
            pages.insert(page, items.into_iter().map(RawRecord::new).collect());
        }

        Ok(Self { latest_page, pages })
    }
}

impl Serialize for CheckpointState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.pages.len() + 1))?;
        map.serialize_entry(LATEST_PAGE_KEY, &self.latest_page)?;
        for (page, records) in &self.pages {
            map.serialize_entry(&page_key(*page), records)?;
        }
        map.end()
    }
}

fn page_key(page: u32) -> String {
    format!("page{}", page)
}

/// Where checkpoint state lives between runs
///
/// The driver only ever talks to this trait, so the JSON file can be swapped
/// for a database row or object storage entry without touching it. There is
/// a single writer per checkpoint; concurrent drivers would need a
/// compare-and-swap or lease on top of `save`.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Load the persisted state, or the empty state if nothing was saved yet
    async fn load(&self) -> IngestResult<CheckpointState>;

    /// Replace the persisted state
    async fn save(&self, state: &CheckpointState) -> IngestResult<()>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Checkpoint stored as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "checkpoint".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self) -> IngestResult<CheckpointState> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No checkpoint found, starting from scratch");
                return Ok(CheckpointState::default());
            },
            Err(e) => {
                return Err(IngestError::corrupt_state(
                    self.path.display().to_string(),
                    format!("failed to read file: {}", e),
                ))
            },
        };

        let value: Value = serde_json::from_slice(&bytes).map_err(|e| {
            IngestError::corrupt_state(self.path.display().to_string(), e.to_string())
        })?;

        let state = CheckpointState::from_json(value)
            .map_err(|reason| IngestError::corrupt_state(self.path.display().to_string(), reason))?;

        debug!(
            path = %self.path.display(),
            latest_page = state.latest_page,
            pages = state.pages.len(),
            "Checkpoint loaded"
        );

        Ok(state)
    }

    /// Write to a sibling temp file, then rename over the target so readers
    /// see either the old or the new state.
    async fn save(&self, state: &CheckpointState) -> IngestResult<()> {
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| IngestError::persistence(format!("failed to encode checkpoint: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                IngestError::persistence(format!(
                    "failed to create checkpoint directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp = self.temp_path();
        let write_err = |e: std::io::Error| {
            IngestError::persistence(format!("failed to write {}: {}", temp.display(), e))
        };
        let mut file = tokio::fs::File::create(&temp).await.map_err(write_err)?;
        file.write_all(&json).await.map_err(write_err)?;
        // the rename must not become visible before the contents are on disk
        file.sync_all().await.map_err(write_err)?;
        drop(file);

        tokio::fs::rename(&temp, &self.path).await.map_err(|e| {
            IngestError::persistence(format!(
                "failed to move {} into place: {}",
                temp.display(),
                e
            ))
        })?;

        debug!(path = %self.path.display(), latest_page = state.latest_page, "Checkpoint saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Checkpoint kept in process memory
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    state: Mutex<Option<CheckpointState>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an already persisted state
    pub fn with_state(state: CheckpointState) -> Self {
        Self {
            state: Mutex::new(Some(state)),
        }
    }

    /// Last saved state, if any
    pub fn snapshot(&self) -> Option<CheckpointState> {
        self.state.lock().ok().and_then(|guard| guard.clone())
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn load(&self) -> IngestResult<CheckpointState> {
        let guard = self
            .state
            .lock()
            .map_err(|_| IngestError::corrupt_state(self.describe(), "lock poisoned"))?;
        Ok(guard.clone().unwrap_or_default())
    }

    async fn save(&self, state: &CheckpointState) -> IngestResult<()> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| IngestError::persistence("checkpoint lock poisoned"))?;
        *guard = Some(state.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
