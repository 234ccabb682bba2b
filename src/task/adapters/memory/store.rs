//! In-memory task store for lifecycle tests.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::task::{
    domain::{Task, TaskCollection, TaskId},
    ports::{LoadOutcome, TaskStore, TaskStoreError, TaskStoreResult},
};

/// Thread-safe in-memory task store.
///
/// Keeps a separate "durable" copy so reload behaviour can be exercised:
/// [`TaskStore::load`] replaces the live collection with whatever was last
/// saved. Writes can be made to fail on demand.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskStore {
    state: Arc<RwLock<InMemoryStoreState>>,
}

#[derive(Debug, Default)]
struct InMemoryStoreState {
    live: TaskCollection,
    durable: TaskCollection,
    fail_writes: bool,
    saves: usize,
}

impl InMemoryTaskStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose durable copy holds `tasks`.
    ///
    /// The live collection stays empty until [`TaskStore::load`].
    #[must_use]
    pub fn with_durable(tasks: impl IntoIterator<Item = Task>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            state.durable = TaskCollection::from_tasks(tasks);
        }
        store
    }

    /// Makes subsequent writes fail (`true`) or succeed (`false`).
    pub fn fail_writes(&self, fail: bool) {
        if let Ok(mut state) = self.state.write() {
            state.fail_writes = fail;
        }
    }

    /// Returns the last saved collection.
    #[must_use]
    pub fn durable(&self) -> TaskCollection {
        self.state
            .read()
            .map(|state| state.durable.clone())
            .unwrap_or_default()
    }

    /// Number of successful saves.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.state.read().map(|state| state.saves).unwrap_or_default()
    }

    fn read(&self) -> TaskStoreResult<RwLockReadGuard<'_, InMemoryStoreState>> {
        self.state.read().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write(&self) -> TaskStoreResult<RwLockWriteGuard<'_, InMemoryStoreState>> {
        self.state.write().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

fn commit(state: &mut InMemoryStoreState, tasks: TaskCollection) -> TaskStoreResult<()> {
    if state.fail_writes {
        return Err(TaskStoreError::persistence(std::io::Error::other(
            "simulated write failure",
        )));
    }
    state.durable = tasks.clone();
    state.live = tasks;
    state.saves += 1;
    Ok(())
}

impl TaskStore for InMemoryTaskStore {
    fn load(&self) -> TaskStoreResult<LoadOutcome> {
        let mut state = self.write()?;
        state.live = state.durable.clone();
        Ok(LoadOutcome::clean(state.live.clone()))
    }

    fn save(&self, tasks: &TaskCollection) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        commit(&mut state, tasks.clone())
    }

    fn list(&self) -> TaskStoreResult<TaskCollection> {
        Ok(self.read()?.live.clone())
    }

    fn get(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        Ok(self.read()?.live.get(id).cloned())
    }

    fn upsert(&self, task: &Task) -> TaskStoreResult<()> {
        let mut state = self.write()?;
        let mut next = state.live.clone();
        next.upsert(task.clone());
        commit(&mut state, next)
    }

    fn remove(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        let mut state = self.write()?;
        let mut next = state.live.clone();
        let Some(removed) = next.remove(id) else {
            return Ok(None);
        };
        commit(&mut state, next)?;
        Ok(Some(removed))
    }

    fn update(&self, edit: &mut dyn FnMut(&mut TaskCollection) -> bool) -> TaskStoreResult<bool> {
        let mut state = self.write()?;
        let mut next = state.live.clone();
        if !edit(&mut next) {
            return Ok(false);
        }
        commit(&mut state, next)?;
        Ok(true)
    }
}
