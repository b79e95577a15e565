//! Read-modify-write access to one URL's check history.

use chrono::{DateTime, Utc};
use pingu_core::{ArchivePolicy, Episode, History, Status, DEFAULT_ARCHIVE_POLICY};
use tracing::debug;

use crate::backend::Backend;
use crate::error::StoreResult;
use crate::key::store_id;

/// The history of a single monitored URL, bound to a backend.
pub struct HistoryStore<B: Backend> {
    backend: B,
    key: String,
    policy: ArchivePolicy,
    history: History,
}

impl<B: Backend> HistoryStore<B> {
    /// Bind to the history for `url` (or the explicit `name`) without touching storage.
    pub fn new(backend: B, url: &str, name: Option<&str>) -> Self {
        let key = store_id(url, name);
        Self {
            history: History::new(url, key.clone()),
            backend,
            key,
            policy: DEFAULT_ARCHIVE_POLICY,
        }
    }

    /// Bind and immediately load (or create) the persisted history.
    pub fn open(backend: B, url: &str, name: Option<&str>) -> StoreResult<Self> {
        let mut store = Self::new(backend, url, name);
        store.read()?;
        Ok(store)
    }

    pub fn with_policy(mut self, policy: ArchivePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load the persisted history. If none exists yet, an empty one is
    /// written so the file is present from the first check on.
    pub fn read(&mut self) -> StoreResult<&History> {
        match self.backend.read(&self.key)? {
            Some(history) => {
                debug!(store_id = %self.key, "history loaded");
                self.history = history;
            }
            None => {
                debug!(store_id = %self.key, location = %self.location(), "creating empty history");
                self.write()?;
            }
        }
        Ok(&self.history)
    }

    /// Persist the in-memory history.
    pub fn write(&self) -> StoreResult<()> {
        self.backend.write(&self.key, &self.history)
    }

    /// Fold one outcome observed at `now` into the history and persist it.
    ///
    /// Returns the updated current episode.
    pub fn save(&mut self, status: Status, message: &str, now: DateTime<Utc>) -> StoreResult<Episode> {
        let current = self.history.record(status, message, now, self.policy).clone();
        debug!(
            store_id = %self.key,
            %status,
            count = current.count,
            "outcome recorded"
        );
        self.write()?;
        Ok(current)
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current(&self) -> Option<&Episode> {
        self.history.current.as_ref()
    }

    pub fn store_id(&self) -> &str {
        &self.key
    }

    pub fn policy(&self) -> ArchivePolicy {
        self.policy
    }

    pub fn location(&self) -> String {
        self.backend.location(&self.key)
    }
}
