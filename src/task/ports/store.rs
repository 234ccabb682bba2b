//! Store port for the canonical task collection.

use crate::task::domain::{Task, TaskCollection, TaskId};
use std::sync::Arc;
use thiserror::Error;

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;

/// Task collection persistence contract.
///
/// A store keeps a live copy of the collection that `list`, `get`, `upsert`,
/// `remove` and `update` operate on. Mutations complete their durable save
/// before returning, and a failed mutation leaves the live copy untouched.
///
/// One store may be shared by several writers in a process. Mutations are
/// serialised by the store, so a read-modify-write must go through
/// [`TaskStore::update`] rather than `list` followed by `save`.
pub trait TaskStore: Send + Sync {
    /// Replaces the live collection with the durable copy.
    ///
    /// A missing blob yields an empty collection. An unreadable blob also
    /// yields an empty collection, with the problem reported in
    /// [`LoadOutcome::warning`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the durable copy cannot
    /// be read at all.
    fn load(&self) -> TaskStoreResult<LoadOutcome>;

    /// Atomically overwrites the durable copy and the live collection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the write fails.
    fn save(&self, tasks: &TaskCollection) -> TaskStoreResult<()>;

    /// Returns every task in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the live collection is
    /// unavailable.
    fn list(&self) -> TaskStoreResult<TaskCollection>;

    /// Finds a task by identifier.
    ///
    /// Returns `None` when the task does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the live collection is
    /// unavailable.
    fn get(&self, id: &TaskId) -> TaskStoreResult<Option<Task>>;

    /// Inserts or replaces a task and saves the collection.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the save fails.
    fn upsert(&self, task: &Task) -> TaskStoreResult<()>;

    /// Removes a task and saves the collection.
    ///
    /// Returns the removed task, or `None` when it did not exist.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the save fails.
    fn remove(&self, id: &TaskId) -> TaskStoreResult<Option<Task>>;

    /// Applies `edit` to a copy of the live collection and saves the copy
    /// when `edit` returns `true`.
    ///
    /// No other mutation of this store runs between reading the collection
    /// and saving it. `edit` must not call back into the store. Returns
    /// whether a save happened.
    ///
    /// The provided implementation is only atomic for a single writer;
    /// stores shared between writers override it and hold their write lock
    /// for the whole call.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the collection cannot be
    /// read or the save fails; the live collection is then unchanged.
    fn update(&self, edit: &mut dyn FnMut(&mut TaskCollection) -> bool) -> TaskStoreResult<bool> {
        let mut next = self.list()?;
        if !edit(&mut next) {
            return Ok(false);
        }
        self.save(&next)?;
        Ok(true)
    }
}

/// Result of [`TaskStore::load`].
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    /// The loaded collection.
    pub tasks: TaskCollection,
    /// Set when the durable copy was unreadable and replaced by an empty
    /// collection.
    pub warning: Option<CorruptDataError>,
}

impl LoadOutcome {
    /// Wraps a cleanly loaded collection.
    #[must_use]
    pub const fn clean(tasks: TaskCollection) -> Self {
        Self {
            tasks,
            warning: None,
        }
    }

    /// Reports an unreadable durable copy as an empty collection.
    #[must_use]
    pub const fn corrupt(warning: CorruptDataError) -> Self {
        Self {
            tasks: TaskCollection::new(),
            warning: Some(warning),
        }
    }
}

/// The durable task blob could not be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("stored task data is corrupt: {reason}")]
pub struct CorruptDataError {
    /// Parser message describing the problem.
    pub reason: String,
}

impl CorruptDataError {
    /// Creates a corrupt-data report.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Errors returned by task store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskStoreError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskStoreError {
    /// Wraps a persistence error.
    #[must_use]
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
