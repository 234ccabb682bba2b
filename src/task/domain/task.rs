//! Task aggregate root.

use super::{
    Priority, StatusChange, TaskDomainError, TaskDraft, TaskId, TaskPatch, TaskStatus, TaskTitle,
    TimeLeft,
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};

/// Task aggregate root.
///
/// Serialises to the persisted record layout: `id`, `title`, `description`,
/// `priority`, `dueDate`, `status` and `createdAt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    #[serde(default)]
    description: String,
    priority: Priority,
    due_date: DateTime<Utc>,
    #[serde(default)]
    status: TaskStatus,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: String,
    /// Persisted priority.
    pub priority: Priority,
    /// Persisted due date.
    pub due_date: DateTime<Utc>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Creates a new `upcoming` task from user input.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank title and
    /// [`TaskDomainError::DueDateNotInFuture`] unless the due date is
    /// strictly after the clock's current instant.
    pub fn create(draft: TaskDraft, clock: &impl Clock) -> Result<Self, TaskDomainError> {
        let now = clock.utc();
        let title = TaskTitle::new(draft.title)?;
        if draft.due_date <= now {
            return Err(TaskDomainError::DueDateNotInFuture {
                due_date: draft.due_date,
                now,
            });
        }

        Ok(Self {
            id: TaskId::new(),
            title,
            description: draft.description,
            priority: draft.priority,
            due_date: draft.due_date,
            status: TaskStatus::Upcoming,
            created_at: now,
        })
    }

    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            priority: data.priority,
            due_date: data.due_date,
            status: data.status,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> &TaskId {
        &self.id
    }

    /// Returns the task title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the task description, empty when none was given.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the task priority.
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns the due date.
    #[must_use]
    pub const fn due_date(&self) -> DateTime<Utc> {
        self.due_date
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Display ordering key: priority rank, then due date ascending.
    #[must_use]
    pub const fn sort_key(&self) -> (u8, DateTime<Utc>) {
        (self.priority.rank(), self.due_date)
    }

    /// Returns the countdown to the due date as seen at `now`.
    #[must_use]
    pub fn time_left(&self, now: DateTime<Utc>) -> TimeLeft {
        TimeLeft::until(self.due_date, now)
    }

    /// Moves the task to `target` unconditionally.
    ///
    /// Returns `None` when the task already has the target status.
    pub fn move_to(&mut self, target: TaskStatus) -> Option<StatusChange> {
        if self.status == target {
            return None;
        }
        let change = StatusChange {
            from: self.status,
            to: target,
        };
        self.status = target;
        Some(change)
    }

    /// Applies the due-timer transition `upcoming → ongoing`.
    ///
    /// Returns `None` unless the task is still `upcoming` and due at `now`,
    /// so repeated firings change the status once.
    pub fn activate_if_due(&mut self, now: DateTime<Utc>) -> Option<StatusChange> {
        if self.status != TaskStatus::Upcoming || now < self.due_date {
            return None;
        }
        self.move_to(TaskStatus::Ongoing)
    }

    /// Applies every automatic transition that holds at `now`.
    ///
    /// An overdue `upcoming` task may pass through `ongoing` to `missed` in
    /// one evaluation; each step is returned in order.
    pub fn advance_automatically(
        &mut self,
        now: DateTime<Utc>,
        grace_period: TimeDelta,
    ) -> Vec<StatusChange> {
        let mut changes = Vec::new();
        while let Some(next) = self
            .status
            .automatic_successor(self.due_date, now, grace_period)
        {
            if let Some(change) = self.move_to(next) {
                changes.push(change);
            }
        }
        changes
    }

    /// Merges the provided fields into this task.
    ///
    /// The due date is taken as given; only the title is validated.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] when the patch carries a
    /// blank title. The task is left unchanged on error.
    pub fn apply_patch(&mut self, patch: TaskPatch) -> Result<(), TaskDomainError> {
        let title = patch.title.map(TaskTitle::new).transpose()?;
        if let Some(value) = title {
            self.title = value;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        Ok(())
    }
}
