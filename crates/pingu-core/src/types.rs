//! Persisted check history: statuses, episodes, and the per-URL history.
//!
//! A `History` keeps one `current` episode (the run of identical outcomes
//! still in progress) plus two archive lists of closed episodes. Which list
//! receives a closed episode is decided by an [`ArchivePolicy`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Status {
    Pass,
    Fail,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pass => "PASS",
            Status::Fail => "FAIL",
        }
    }

    pub fn opposite(&self) -> Status {
        match self {
            Status::Pass => Status::Fail,
            Status::Fail => Status::Pass,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A maximal run of consecutive outcomes sharing the same status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    pub start: DateTime<Utc>,
    pub last: DateTime<Utc>,
    /// Seconds between the two most recent outcomes folded into this episode.
    pub interval: f64,
    pub count: u64,
    pub status: Status,
    pub message: String,
}

impl Episode {
    /// Open a new episode for a single outcome observed at `now`.
    pub fn open(status: Status, message: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            start: now,
            last: now,
            interval: 0.0,
            count: 1,
            status,
            message: message.into(),
        }
    }

    /// Fold another outcome with the same status into this episode.
    fn extend(&mut self, message: String, now: DateTime<Utc>) {
        self.count += 1;
        self.interval = (now - self.last).num_milliseconds() as f64 / 1000.0;
        self.last = now;
        self.message = message;
    }

    /// Wall-clock span covered by the episode.
    pub fn duration(&self) -> chrono::TimeDelta {
        self.last - self.start
    }
}

/// The archive list a closed episode is appended to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveList {
    Failures,
    Passes,
}

/// Mapping from a closed episode's status to the archive list receiving it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArchivePolicy {
    /// A closed PASS episode goes to `failures`, a closed FAIL episode to
    /// `passes`. The list is named after the status that displaced it.
    #[default]
    OppositeStatus,
    /// A closed episode goes to the list named after its own status.
    OwnStatus,
}

/// The archive mapping used when none is configured.
pub const DEFAULT_ARCHIVE_POLICY: ArchivePolicy = ArchivePolicy::OppositeStatus;

impl ArchivePolicy {
    pub fn list_for(&self, closed: Status) -> ArchiveList {
        let key = match self {
            ArchivePolicy::OppositeStatus => closed.opposite(),
            ArchivePolicy::OwnStatus => closed,
        };
        match key {
            Status::Pass => ArchiveList::Passes,
            Status::Fail => ArchiveList::Failures,
        }
    }
}

/// Full persisted record for one monitored URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    pub url: String,
    #[serde(rename = "store-id")]
    pub store_id: String,
    /// Absent until the first outcome is recorded.
    pub current: Option<Episode>,
    #[serde(default)]
    pub failures: Vec<Episode>,
    #[serde(default)]
    pub passes: Vec<Episode>,
}

impl History {
    pub fn new(url: impl Into<String>, store_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            store_id: store_id.into(),
            current: None,
            failures: Vec::new(),
            passes: Vec::new(),
        }
    }

    /// Fold one outcome into the history and return the updated current episode.
    ///
    /// A repeat of the current status extends the current episode. A status
    /// change archives the current episode according to `policy` and opens a
    /// fresh one.
    pub fn record(
        &mut self,
        status: Status,
        message: impl Into<String>,
        now: DateTime<Utc>,
        policy: ArchivePolicy,
    ) -> &Episode {
        let message = message.into();
        let episode = match self.current.take() {
            Some(mut current) if current.status == status => {
                current.extend(message, now);
                current
            }
            previous => {
                if let Some(closed) = previous {
                    match policy.list_for(closed.status) {
                        ArchiveList::Failures => self.failures.push(closed),
                        ArchiveList::Passes => self.passes.push(closed),
                    }
                }
                Episode::open(status, message, now)
            }
        };
        self.current.insert(episode)
    }

    /// All archived episodes ordered by their last outcome, oldest first.
    pub fn archived(&self) -> Vec<&Episode> {
        let mut all: Vec<&Episode> = self.passes.iter().chain(self.failures.iter()).collect();
        all.sort_by_key(|e| e.last);
        all
    }
}
