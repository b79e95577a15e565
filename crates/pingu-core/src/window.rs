//! Recurring quiet windows.
//!
//! A quiet window is written as `[DOW] HH:MM [AM|PM] - [DOW] HH:MM [AM|PM]`,
//! for example `SAT 10:00 PM - SUN 1:00 AM` or `23:00 - 23:30`. Day names
//! are matched by prefix (`SAT`, `SATURDAY`) and are case-insensitive.
//! Without AM/PM the hour is read as 24-hour.
//!
//! The occurrence tested for an instant is anchored on that instant: the
//! start is the most recent matching day at or before it, and the end is the
//! earliest matching day at or after the resolved start. An anchor without a
//! day name takes the reference day (for the start) or the start day (for the
//! end). Both bounds are inclusive.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Weekday};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{CoreError, CoreResult};

const DAY_NAMES: [(Weekday, &str); 7] = [
    (Weekday::Mon, "MONDAY"),
    (Weekday::Tue, "TUESDAY"),
    (Weekday::Wed, "WEDNESDAY"),
    (Weekday::Thu, "THURSDAY"),
    (Weekday::Fri, "FRIDAY"),
    (Weekday::Sat, "SATURDAY"),
    (Weekday::Sun, "SUNDAY"),
];

fn anchor_pattern(prefix: &str) -> String {
    format!(
        r"(?:(?P<{prefix}day>[A-Z]+)\s*)?(?P<{prefix}hour>\d{{1,2}}):(?P<{prefix}minute>\d{{2}})\s*(?P<{prefix}meridiem>AM|PM)?"
    )
}

static ANCHOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(&format!(r"^\s*{}\s*$", anchor_pattern(""))).expect("valid anchor regex"));

static WINDOW_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^\s*{}\s*-\s*{}\s*$",
        anchor_pattern("start_"),
        anchor_pattern("end_")
    ))
    .expect("valid window regex")
});

fn parse_weekday(token: &str) -> Option<Weekday> {
    if token.len() < 3 {
        return None;
    }
    DAY_NAMES
        .iter()
        .find(|(_, name)| name.starts_with(token))
        .map(|(day, _)| *day)
}

fn weekday_abbrev(day: Weekday) -> &'static str {
    let (_, name) = DAY_NAMES[day.num_days_from_monday() as usize];
    &name[..3]
}

/// A point in the week: an optional day plus a time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayAnchor {
    pub weekday: Option<Weekday>,
    pub time: NaiveTime,
}

impl DayAnchor {
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    fn from_captures(spec: &str, caps: &Captures<'_>, prefix: &str) -> CoreResult<Self> {
        let group = |name: &str| caps.name(&format!("{prefix}{name}")).map(|m| m.as_str());

        let weekday = match group("day") {
            Some(token) => Some(
                parse_weekday(token)
                    .ok_or_else(|| CoreError::window(spec, format!("'{token}' is not a day of the week")))?,
            ),
            None => None,
        };

        let hour_text = group("hour").unwrap_or_default();
        let minute_text = group("minute").unwrap_or_default();
        let hour: u32 = hour_text
            .parse()
            .map_err(|_| CoreError::window(spec, format!("'{hour_text}' is invalid hour value")))?;
        let minute: u32 = minute_text
            .parse()
            .map_err(|_| CoreError::window(spec, format!("'{minute_text}' is invalid minute value")))?;

        let hour = match group("meridiem") {
            Some(meridiem) => {
                if !(1..=12).contains(&hour) {
                    return Err(CoreError::window(spec, format!("hour {hour} is out of range for {meridiem}")));
                }
                match (meridiem, hour) {
                    ("AM", 12) => 0,
                    ("PM", 12) => 12,
                    ("PM", h) => h + 12,
                    (_, h) => h,
                }
            }
            None => hour,
        };

        let time = NaiveTime::from_hms_opt(hour, minute, 0)
            .ok_or_else(|| CoreError::window(spec, format!("{hour_text}:{minute_text} is not a valid time")))?;

        Ok(Self { weekday, time })
    }

    /// Most recent occurrence at or before `reference`'s day.
    fn on_or_before(&self, reference: NaiveDateTime) -> NaiveDateTime {
        let date = reference.date();
        let day = match self.weekday {
            None => date,
            Some(target) => (0..7)
                .map(|back| date - TimeDelta::days(back))
                .find(|d| d.weekday() == target)
                .unwrap_or(date),
        };
        day.and_time(self.time)
    }

    /// Earliest occurrence on or after `from`'s day.
    fn on_or_after(&self, from: NaiveDateTime) -> NaiveDateTime {
        let date = from.date();
        let target = self.weekday.unwrap_or(date.weekday());
        let day = (0..7)
            .map(|forward| date + TimeDelta::days(forward))
            .find(|d| d.weekday() == target)
            .unwrap_or(date);
        day.and_time(self.time)
    }
}

impl FromStr for DayAnchor {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let normalized = s.to_uppercase();
        let caps = ANCHOR_RE
            .captures(&normalized)
            .ok_or_else(|| CoreError::window(s, "expected '[DOW] HH:MM [AM|PM]'"))?;
        Self::from_captures(s, &caps, "")
    }
}

impl fmt::Display for DayAnchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(day) = self.weekday {
            write!(f, "{} ", weekday_abbrev(day))?;
        }
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// A parsed quiet window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuietWindow {
    spec: String,
    pub start: DayAnchor,
    pub end: DayAnchor,
}

impl QuietWindow {
    pub fn parse(spec: &str) -> CoreResult<Self> {
        let normalized = spec.to_uppercase();
        let caps = WINDOW_RE
            .captures(&normalized)
            .ok_or_else(|| CoreError::window(spec, "expected '[DOW] HH:MM [AM|PM] - [DOW] HH:MM [AM|PM]'"))?;
        Ok(Self {
            spec: spec.trim().to_string(),
            start: DayAnchor::from_captures(spec, &caps, "start_")?,
            end: DayAnchor::from_captures(spec, &caps, "end_")?,
        })
    }

    /// The text this window was parsed from.
    pub fn spec(&self) -> &str {
        &self.spec
    }

    /// Start and end of the occurrence that is current relative to `reference`.
    pub fn bounds(&self, reference: NaiveDateTime) -> (NaiveDateTime, NaiveDateTime) {
        let start = self.start.on_or_before(reference);
        let end = self.end.on_or_after(start);
        (start, end)
    }

    pub fn contains(&self, reference: NaiveDateTime) -> bool {
        let (start, end) = self.bounds(reference);
        let inside = start <= reference && reference <= end;
        trace!(window = %self.spec, %reference, %start, %end, inside, "quiet window evaluated");
        inside
    }
}

impl FromStr for QuietWindow {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for QuietWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start, self.end)
    }
}

/// Parse `spec` and test whether `instant` falls inside it.
pub fn in_window(spec: &str, instant: NaiveDateTime) -> CoreResult<bool> {
    Ok(QuietWindow::parse(spec)?.contains(instant))
}

/// What to do with a quiet window that fails to parse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidWindowPolicy {
    /// Reject the whole invocation.
    #[default]
    Fail,
    /// Log the window and leave it out.
    Ignore,
}

/// An ordered set of quiet windows, parsed up front.
#[derive(Debug, Clone, Default)]
pub struct QuietWindows(Vec<QuietWindow>);

impl QuietWindows {
    pub fn parse_all<I, S>(specs: I, policy: InvalidWindowPolicy) -> CoreResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut windows = Vec::new();
        for spec in specs {
            let spec = spec.as_ref();
            if spec.trim().is_empty() {
                continue;
            }
            match QuietWindow::parse(spec) {
                Ok(window) => windows.push(window),
                Err(e) if policy == InvalidWindowPolicy::Ignore => {
                    warn!(error = %e, "ignoring malformed quiet window");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(Self(windows))
    }

    /// The first window containing `instant`, if any.
    pub fn first_active(&self, instant: NaiveDateTime) -> Option<&QuietWindow> {
        self.0.iter().find(|w| w.contains(instant))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
