//! Plain-text alert and report content.

use chrono::TimeDelta;
use pingu_core::{Episode, History, Status};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn alert_subject(url: &str) -> String {
    format!("URL CHECK FAILURE: {url}")
}

pub fn alert_body(url: &str, episode: &Episode) -> String {
    let mut body = format!("URL CHECK FAILED FOR: {url}\r\n\r\n");
    body.push_str(&format!(
        "FAILURE STARTED AT: {} UTC\r\n",
        episode.start.format(TIMESTAMP_FORMAT)
    ));
    body.push_str(&format!(
        "LAST FAILURE AT:    {} UTC\r\n",
        episode.last.format(TIMESTAMP_FORMAT)
    ));
    body.push_str(&format!("URL CHECKED {} TIMES.\r\n", episode.count));
    if !episode.message.is_empty() {
        body.push_str(&format!("\r\nLAST ERROR: {}\r\n", episode.message));
    }
    body
}

fn counted(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {unit}")
    } else {
        format!("{n} {unit}s")
    }
}

/// Human-readable span in whole minutes, e.g. `2 days, 3 hours and 5 minutes`.
///
/// Spans under a minute render as an empty string.
pub fn duration_string(duration: TimeDelta) -> String {
    let total = duration.num_minutes().max(0);
    let (days, hours, minutes) = (total / 1440, total / 60 % 24, total % 60);

    let mut out = String::new();
    if days > 0 {
        out.push_str(&counted(days, "day"));
    }
    if hours > 0 {
        if !out.is_empty() {
            out.push_str(", ");
        }
        out.push_str(&counted(hours, "hour"));
    }
    if minutes > 0 {
        if !out.is_empty() {
            out.push_str(" and ");
        }
        out.push_str(&counted(minutes, "minute"));
    }
    out
}

/// One status line, e.g. `2024-01-06 23:00:00 PASSING 245 checks for 1 day.`
pub fn episode_summary(episode: &Episode) -> String {
    let status = match episode.status {
        Status::Pass => "PASSING",
        Status::Fail => "FAILING",
    };
    format!(
        "{} {status} {} checks for {}.",
        episode.last.format(TIMESTAMP_FORMAT),
        episode.count,
        duration_string(episode.duration())
    )
}

/// Summary of a URL's current state and archived runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub url: String,
    pub current: Option<String>,
    /// Archived episodes, oldest first.
    pub history: Vec<String>,
}

impl Report {
    pub fn from_history(history: &History) -> Self {
        Self {
            url: history.url.clone(),
            current: history.current.as_ref().map(episode_summary),
            history: history.archived().into_iter().map(episode_summary).collect(),
        }
    }

    pub fn subject(&self) -> String {
        format!("URL CHECK REPORT: {}", self.url)
    }

    pub fn to_text(&self) -> String {
        let mut text = format!("URL CHECK REPORT FOR: {}\n\nCURRENT:\n", self.url);
        match &self.current {
            Some(line) => text.push_str(line),
            None => text.push_str("no checks recorded"),
        }
        text.push('\n');
        if !self.history.is_empty() {
            text.push_str("\nHISTORY:\n");
            for line in &self.history {
                text.push_str(line);
                text.push('\n');
            }
        }
        text
    }
}
