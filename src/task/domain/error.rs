//! Error types for task domain validation and parsing.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors returned while constructing or changing domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("Please fill in all required fields.")]
    EmptyTitle,

    /// The due date is not strictly after the creation instant.
    #[error("Due date cannot be in the past.")]
    DueDateNotInFuture {
        /// Requested due date.
        due_date: DateTime<Utc>,
        /// Clock reading the due date was checked against.
        now: DateTime<Utc>,
    },

    /// The task identifier is blank.
    #[error("invalid task identifier: {0}")]
    InvalidTaskId(String),

    /// The status name is not one of the known buckets.
    #[error(transparent)]
    UnknownStatus(#[from] ParseTaskStatusError),

    /// The priority name is not one of the known priorities.
    #[error(transparent)]
    UnknownPriority(#[from] ParsePriorityError),
}

/// Error returned while parsing task statuses from external input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing priorities from external input.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task priority: {0}")]
pub struct ParsePriorityError(pub String);
