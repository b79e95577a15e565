//! Storage backends for serialized histories.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use pingu_core::History;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::key::file_name;

/// Convert any `Display` error into a `StoreError` variant, prefixed with a location.
macro_rules! map_err {
    ($variant:ident, $location:expr) => {
        |e| StoreError::$variant(format!("{}: {}", $location, e))
    };
}

/// Where histories are kept, keyed by store id.
pub trait Backend {
    /// Load the history for `key`, or `None` if nothing has been stored yet.
    fn read(&self, key: &str) -> StoreResult<Option<History>>;

    /// Replace the history stored under `key`.
    fn write(&self, key: &str, history: &History) -> StoreResult<()>;

    /// Human-readable location of `key`, for messages.
    fn location(&self, key: &str) -> String;
}

/// One JSON file per history inside a directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    /// Open (or create) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> StoreResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(map_err!(Open, dir.display()))?;
        debug!(dir = ?dir, "history directory opened");
        Ok(Self { dir })
    }

    /// Open the per-user data directory (`<data dir>/pingu`).
    pub fn open_default() -> StoreResult<Self> {
        let dir = dirs::data_dir().ok_or(StoreError::NoDataDir)?;
        Self::open(dir.join("pingu"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(file_name(key))
    }
}

impl Backend for FileBackend {
    fn read(&self, key: &str) -> StoreResult<Option<History>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read(&path).map_err(map_err!(Read, path.display()))?;
        let history = serde_json::from_slice(&content).map_err(map_err!(Deserialize, path.display()))?;
        Ok(Some(history))
    }

    fn write(&self, key: &str, history: &History) -> StoreResult<()> {
        let path = self.path_for(key);
        let content = serde_json::to_vec_pretty(history).map_err(map_err!(Serialize, path.display()))?;

        // Write beside the target so the rename stays on one filesystem.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(map_err!(Write, self.dir.display()))?;
        tmp.write_all(&content).map_err(map_err!(Write, path.display()))?;
        tmp.as_file().sync_all().map_err(map_err!(Write, path.display()))?;
        tmp.persist(&path).map_err(map_err!(Write, path.display()))?;

        debug!(path = ?path, bytes = content.len(), "history written");
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        self.path_for(key).display().to_string()
    }
}

/// Shared in-memory backend. Clones see the same data.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    docs: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON stored under `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.docs.lock().unwrap_or_else(|e| e.into_inner()).get(key).cloned()
    }

    /// Store raw text under `key`, bypassing serialization.
    pub fn put_raw(&self, key: &str, content: impl Into<String>) {
        self.docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), content.into());
    }
}

impl Backend for MemoryBackend {
    fn read(&self, key: &str) -> StoreResult<Option<History>> {
        match self.raw(key) {
            Some(content) => {
                let history = serde_json::from_str(&content).map_err(map_err!(Deserialize, self.location(key)))?;
                Ok(Some(history))
            }
            None => Ok(None),
        }
    }

    fn write(&self, key: &str, history: &History) -> StoreResult<()> {
        let content = serde_json::to_string(history).map_err(map_err!(Serialize, self.location(key)))?;
        self.put_raw(key, content);
        Ok(())
    }

    fn location(&self, key: &str) -> String {
        format!("memory:{key}")
    }
}
