//! Task status buckets and the automatic transition rules between them.

use super::ParseTaskStatusError;
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a task. Each status is also a presentation bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created and waiting for its due date.
    #[default]
    Upcoming,
    /// Due date reached; the task needs attention.
    Ongoing,
    /// Finished by the user.
    Completed,
    /// Left ongoing beyond the grace window.
    Missed,
}

impl TaskStatus {
    /// Every status in bucket display order.
    pub const ALL: [Self; 4] = [Self::Upcoming, Self::Ongoing, Self::Completed, Self::Missed];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Upcoming => "upcoming",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Missed => "missed",
        }
    }

    /// Returns whether time-driven transitions stop at this status.
    ///
    /// Users may still move terminal tasks manually.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Missed)
    }

    /// Returns the status an automatic evaluation moves to, if any.
    ///
    /// `upcoming` becomes `ongoing` once `now` reaches `due_date`; `ongoing`
    /// becomes `missed` once `now` is more than `grace_period` past
    /// `due_date`. Terminal statuses never move.
    #[must_use]
    pub fn automatic_successor(
        self,
        due_date: DateTime<Utc>,
        now: DateTime<Utc>,
        grace_period: TimeDelta,
    ) -> Option<Self> {
        match self {
            Self::Upcoming if now >= due_date => Some(Self::Ongoing),
            Self::Ongoing if now.signed_duration_since(due_date) > grace_period => {
                Some(Self::Missed)
            }
            _ => None,
        }
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "upcoming" => Ok(Self::Upcoming),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "missed" => Ok(Self::Missed),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A status change applied to a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatusChange {
    /// Status before the change.
    pub from: TaskStatus,
    /// Status after the change.
    pub to: TaskStatus,
}

impl StatusChange {
    /// Returns whether the change took the task out of `upcoming`, which
    /// makes its pending timers obsolete.
    #[must_use]
    pub fn left_upcoming(self) -> bool {
        self.from == TaskStatus::Upcoming && self.to != TaskStatus::Upcoming
    }
}
