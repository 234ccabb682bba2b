//! Unvalidated task input used for creation and field merges.

use super::{Priority, TaskStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fields supplied when creating a task.
///
/// Values are validated by [`super::Task::create`], not here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskDraft {
    /// Raw title; blank titles are rejected at creation.
    pub title: String,
    /// Optional description.
    #[serde(default)]
    pub description: String,
    /// Requested priority.
    pub priority: Priority,
    /// Requested due date; must be strictly in the future at creation.
    pub due_date: DateTime<Utc>,
}

impl TaskDraft {
    /// Creates a draft from its parts.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        priority: Priority,
        due_date: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            priority,
            due_date,
        }
    }
}

/// Partial field set merged into an existing task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    /// Replacement title.
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement priority.
    #[serde(default)]
    pub priority: Option<Priority>,
    /// Replacement due date, not re-validated.
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    /// Replacement status.
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

impl TaskPatch {
    /// Returns whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
    }
}
