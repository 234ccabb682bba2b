//! Typed lifecycle events delivered to listeners.

use super::{Task, TaskId, TaskStatus};
use chrono::{DateTime, Utc};

/// What triggered a status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionCause {
    /// The task's due timer fired.
    DueTimer,
    /// The periodic sweep found the transition due.
    Sweep,
    /// A user moved, completed or edited the task.
    Manual,
}

/// Event emitted by the lifecycle engine after a committed change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// A task was created and persisted.
    TaskCreated {
        /// The created task.
        task: Task,
    },
    /// A task changed status.
    StatusChanged {
        /// Affected task.
        task_id: TaskId,
        /// Status before the change.
        from: TaskStatus,
        /// Status after the change.
        to: TaskStatus,
        /// Trigger of the change.
        cause: TransitionCause,
    },
    /// A still-upcoming task is within the reminder lead of its due date.
    ReminderDue {
        /// Affected task.
        task_id: TaskId,
        /// The task's due date.
        due_date: DateTime<Utc>,
    },
    /// A task was removed.
    TaskDeleted {
        /// Removed task.
        task_id: TaskId,
    },
    /// The collection was reloaded from the store.
    TasksReloaded {
        /// Number of tasks after the reload.
        count: usize,
    },
}
