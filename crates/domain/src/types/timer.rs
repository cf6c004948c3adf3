//! Time entries and timer transitions

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::null_as_default;
use crate::constants::EPOCH_ENCODED_DURATION_THRESHOLD;

/// A time entry as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: u64,
    pub workspace_id: u64,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub description: Option<String>,
    pub start: DateTime<Utc>,
    #[serde(default)]
    pub stop: Option<DateTime<Utc>>,
    /// Seconds for stopped entries; negative while running
    pub duration: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tag_ids: Vec<u64>,
    #[serde(default)]
    pub billable: bool,
}

impl TimeEntry {
    pub const fn is_running(&self) -> bool {
        self.stop.is_none()
    }

    /// Elapsed seconds at `now`
    ///
    /// Stopped entries report `duration` verbatim. Running entries carry a
    /// negative duration: either the negated start epoch, in which case
    /// `now + duration` is the elapsed time, or the negated elapsed seconds
    /// themselves. A running entry without a negative duration falls back to
    /// its start time.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        if !self.is_running() {
            return self.duration;
        }
        match self.duration {
            d if d <= -EPOCH_ENCODED_DURATION_THRESHOLD => now.timestamp() + d,
            d if d < 0 => -d,
            _ => (now - self.start).num_seconds().max(0),
        }
    }

    /// Fields whose change counts as an in-place edit
    pub fn same_details(&self, other: &Self) -> bool {
        self.description == other.description
            && self.project_id == other.project_id
            && self.start == other.start
            && same_tags(&self.tag_ids, &other.tag_ids)
    }
}

/// Tag lists compare as sets: order and multiplicity are ignored
pub fn same_tags(a: &[u64], b: &[u64]) -> bool {
    let a: HashSet<_> = a.iter().collect();
    let b: HashSet<_> = b.iter().collect();
    a == b
}

/// Request body for starting a timer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTimeEntry {
    pub description: Option<String>,
    pub project_id: Option<u64>,
    #[serde(default)]
    pub tag_ids: Vec<u64>,
    #[serde(default)]
    pub billable: bool,
}

/// Fully stamped start request as sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartTimeEntry {
    #[serde(flatten)]
    pub entry: NewTimeEntry,
    pub created_with: String,
    pub start: DateTime<Utc>,
    /// Negated start epoch, the provider's running-timer encoding
    pub duration: i64,
    pub stop: Option<DateTime<Utc>>,
    pub workspace_id: u64,
}

impl StartTimeEntry {
    pub fn new(
        entry: NewTimeEntry,
        created_with: impl Into<String>,
        start: DateTime<Utc>,
        workspace_id: u64,
    ) -> Self {
        Self {
            entry,
            created_with: created_with.into(),
            start,
            duration: -start.timestamp(),
            stop: None,
            workspace_id,
        }
    }
}

/// Outcome of comparing a polled timer against the stored snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimerTransition {
    /// No timer before, one now
    Started,
    /// A different timer replaced the previous one
    Switched,
    /// Same timer with edited details
    Edited,
    /// The timer went away
    Stopped,
    Unchanged,
}

impl TimerTransition {
    /// Classify `current` against `previous`
    pub fn classify(previous: Option<&TimeEntry>, current: Option<&TimeEntry>) -> Self {
        match (previous, current) {
            (None, Some(_)) => Self::Started,
            (Some(prev), Some(curr)) if prev.id != curr.id => Self::Switched,
            (Some(prev), Some(curr)) if !prev.same_details(curr) => Self::Edited,
            (Some(_), None) => Self::Stopped,
            _ => Self::Unchanged,
        }
    }

    pub const fn is_changed(self) -> bool {
        !matches!(self, Self::Unchanged)
    }
}
