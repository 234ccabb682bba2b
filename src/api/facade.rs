//! Request/response mapping over the task store.

use crate::task::{
    domain::{Task, TaskCollection, TaskDomainError, TaskDraft, TaskId, TaskPatch},
    ports::{TaskStore, TaskStoreError},
};
use mockable::Clock;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Callback run after every successful write.
pub type ChangeHook = Arc<dyn Fn() + Send + Sync>;

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failures reported by [`TaskApi`].
///
/// Display strings are the messages returned to HTTP clients.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request fields failed validation.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),

    /// No task has the requested id.
    #[error("Task not found")]
    NotFound,

    /// The collection could not be read.
    #[error("Failed to read tasks")]
    ReadFailed(#[source] TaskStoreError),

    /// A create could not be persisted.
    #[error("Failed to create task")]
    CreateFailed(#[source] TaskStoreError),

    /// An update could not be persisted.
    #[error("Failed to update task")]
    UpdateFailed(#[source] TaskStoreError),

    /// A delete could not be persisted.
    #[error("Failed to delete task")]
    DeleteFailed(#[source] TaskStoreError),
}

/// Stateless CRUD facade over a task store.
pub struct TaskApi<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    store: Arc<S>,
    clock: Arc<C>,
    on_change: Option<ChangeHook>,
}

impl<S, C> TaskApi<S, C>
where
    S: TaskStore,
    C: Clock + Send + Sync,
{
    /// Creates a facade over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>, clock: Arc<C>) -> Self {
        Self {
            store,
            clock,
            on_change: None,
        }
    }

    /// Runs `hook` after every successful create, update or delete.
    #[must_use]
    pub fn with_change_hook(mut self, hook: ChangeHook) -> Self {
        self.on_change = Some(hook);
        self
    }

    /// Returns every stored task.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::ReadFailed`] when the stored collection cannot
    /// be read or parsed.
    pub fn list(&self) -> ApiResult<Vec<Task>> {
        self.refresh().map_err(ApiError::ReadFailed)?;
        let tasks = self.store.list().map_err(ApiError::ReadFailed)?;
        Ok(tasks.into_vec())
    }

    /// Validates and stores a new task with a fresh id and creation time.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] for invalid fields and
    /// [`ApiError::CreateFailed`] when the collection cannot be read or
    /// written.
    pub fn create(&self, draft: TaskDraft) -> ApiResult<Task> {
        let task = Task::create(draft, &*self.clock)?;
        self.refresh().map_err(ApiError::CreateFailed)?;
        self.store.upsert(&task).map_err(ApiError::CreateFailed)?;
        debug!(task_id = %task.id(), "task created through the API");
        self.changed();
        Ok(task)
    }

    /// Merges `patch` into the task with `id`.
    ///
    /// The due date is stored as given. The merge and its save run as one
    /// store update, so concurrent writers cannot interleave.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown or blank id,
    /// [`ApiError::Validation`] for a blank title and
    /// [`ApiError::UpdateFailed`] when the collection cannot be read or
    /// written.
    pub fn update(&self, id: &str, patch: TaskPatch) -> ApiResult<Task> {
        let id = parse_id(id)?;
        self.refresh().map_err(ApiError::UpdateFailed)?;
        let mut pending = Some(patch);
        let mut outcome = None;
        self.store
            .update(&mut |collection: &mut TaskCollection| {
                let (Some(task), Some(patch)) = (collection.get_mut(&id), pending.take()) else {
                    return false;
                };
                let merged = task.apply_patch(patch).map(|()| task.clone());
                let changed = merged.is_ok();
                outcome = Some(merged);
                changed
            })
            .map_err(ApiError::UpdateFailed)?;
        let task = outcome.ok_or(ApiError::NotFound)??;
        debug!(task_id = %id, "task updated through the API");
        self.changed();
        Ok(task)
    }

    /// Deletes the task with `id`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] for an unknown or blank id and
    /// [`ApiError::DeleteFailed`] when the collection cannot be read or
    /// written.
    pub fn delete(&self, id: &str) -> ApiResult<()> {
        let id = parse_id(id)?;
        self.refresh().map_err(ApiError::DeleteFailed)?;
        self.store
            .remove(&id)
            .map_err(ApiError::DeleteFailed)?
            .ok_or(ApiError::NotFound)?;
        debug!(task_id = %id, "task deleted through the API");
        self.changed();
        Ok(())
    }

    /// Re-reads the stored collection. Unparsable data is a failure here,
    /// unlike for the lifecycle engine.
    fn refresh(&self) -> Result<(), TaskStoreError> {
        let outcome = self.store.load()?;
        match outcome.warning {
            Some(corrupt) => {
                warn!(error = %corrupt, "stored tasks are unreadable");
                Err(TaskStoreError::persistence(corrupt))
            }
            None => Ok(()),
        }
    }

    fn changed(&self) {
        if let Some(hook) = &self.on_change {
            hook();
        }
    }
}

fn parse_id(raw: &str) -> ApiResult<TaskId> {
    TaskId::from_str(raw).map_err(|_| ApiError::NotFound)
}
