//! Task store backed by a pretty-printed JSON array on disk.

use crate::task::{
    domain::{Task, TaskCollection, TaskId},
    ports::{CorruptDataError, LoadOutcome, TaskStore, TaskStoreError, TaskStoreResult},
};
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use std::io::{ErrorKind, Write};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, warn};

const EMPTY_COLLECTION: &str = "[]";

/// Task store persisting to a single JSON file.
///
/// The file holds an array of task records. Saves write a sibling temporary
/// file, sync it, and rename it over the target so readers never observe a
/// partial write.
#[derive(Debug)]
pub struct JsonFileTaskStore {
    dir: Dir,
    file_name: String,
    path: Utf8PathBuf,
    live: RwLock<TaskCollection>,
}

impl JsonFileTaskStore {
    /// Opens a store for `path`. The parent directory must exist; the file
    /// itself may not.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the path has no file
    /// name or its parent directory cannot be opened.
    pub fn open(path: impl AsRef<Utf8Path>) -> TaskStoreResult<Self> {
        let path = path.as_ref();
        let file_name = path.file_name().ok_or_else(|| {
            TaskStoreError::persistence(std::io::Error::other(format!(
                "data file path {path} must include a file name"
            )))
        })?;
        let parent = path
            .parent()
            .filter(|parent| !parent.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let dir =
            Dir::open_ambient_dir(parent, ambient_authority()).map_err(TaskStoreError::persistence)?;

        Ok(Self {
            dir,
            file_name: file_name.to_owned(),
            path: path.to_owned(),
            live: RwLock::new(TaskCollection::new()),
        })
    }

    /// Returns the data file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Writes an empty collection when the data file does not exist yet.
    ///
    /// Returns `true` when the file was created.
    ///
    /// # Errors
    ///
    /// Returns [`TaskStoreError::Persistence`] when the file cannot be
    /// inspected or written.
    pub fn initialise(&self) -> TaskStoreResult<bool> {
        match self.dir.metadata(&self.file_name) {
            Ok(_) => Ok(false),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                self.write_atomically(EMPTY_COLLECTION)?;
                debug!(path = %self.path, "initialised empty task data file");
                Ok(true)
            }
            Err(err) => Err(TaskStoreError::persistence(err)),
        }
    }

    fn temp_name(&self) -> String {
        format!(".{}.tmp", self.file_name)
    }

    fn read_durable(&self) -> TaskStoreResult<LoadOutcome> {
        let contents = match self.dir.read_to_string(&self.file_name) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Ok(LoadOutcome::clean(TaskCollection::new()));
            }
            Err(err) => return Err(TaskStoreError::persistence(err)),
        };

        match serde_json::from_str::<Vec<Task>>(&contents) {
            Ok(tasks) => Ok(LoadOutcome::clean(TaskCollection::from_tasks(tasks))),
            Err(err) => {
                warn!(path = %self.path, error = %err, "task data file is corrupt; starting empty");
                Ok(LoadOutcome::corrupt(CorruptDataError::new(err.to_string())))
            }
        }
    }

    fn write_durable(&self, tasks: &TaskCollection) -> TaskStoreResult<()> {
        let json = serde_json::to_string_pretty(tasks).map_err(TaskStoreError::persistence)?;
        self.write_atomically(&json)
    }

    fn write_atomically(&self, contents: &str) -> TaskStoreResult<()> {
        let temp_name = self.temp_name();
        let result = (|| -> std::io::Result<()> {
            let mut file = self.dir.create(&temp_name)?;
            file.write_all(contents.as_bytes())?;
            file.sync_all()?;
            self.dir.rename(&temp_name, &self.dir, &self.file_name)
        })();
        if let Err(err) = result {
            if let Err(cleanup) = self.dir.remove_file(&temp_name) {
                if cleanup.kind() != ErrorKind::NotFound {
                    debug!(path = %self.path, error = %cleanup, "could not remove temporary file");
                }
            }
            return Err(TaskStoreError::persistence(err));
        }
        Ok(())
    }

    fn read_live(&self) -> TaskStoreResult<RwLockReadGuard<'_, TaskCollection>> {
        self.live.read().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }

    fn write_live(&self) -> TaskStoreResult<RwLockWriteGuard<'_, TaskCollection>> {
        self.live.write().map_err(|err| {
            TaskStoreError::persistence(std::io::Error::other(err.to_string()))
        })
    }
}

impl TaskStore for JsonFileTaskStore {
    fn load(&self) -> TaskStoreResult<LoadOutcome> {
        let mut live = self.write_live()?;
        let outcome = self.read_durable()?;
        live.clone_from(&outcome.tasks);
        Ok(outcome)
    }

    fn save(&self, tasks: &TaskCollection) -> TaskStoreResult<()> {
        let mut live = self.write_live()?;
        self.write_durable(tasks)?;
        live.clone_from(tasks);
        Ok(())
    }

    fn list(&self) -> TaskStoreResult<TaskCollection> {
        Ok(self.read_live()?.clone())
    }

    fn get(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        Ok(self.read_live()?.get(id).cloned())
    }

    fn upsert(&self, task: &Task) -> TaskStoreResult<()> {
        let mut live = self.write_live()?;
        let mut next = live.clone();
        next.upsert(task.clone());
        self.write_durable(&next)?;
        *live = next;
        Ok(())
    }

    fn remove(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        let mut live = self.write_live()?;
        let mut next = live.clone();
        let Some(removed) = next.remove(id) else {
            return Ok(None);
        };
        self.write_durable(&next)?;
        *live = next;
        Ok(Some(removed))
    }

    fn update(&self, edit: &mut dyn FnMut(&mut TaskCollection) -> bool) -> TaskStoreResult<bool> {
        let mut live = self.write_live()?;
        let mut next = live.clone();
        if !edit(&mut next) {
            return Ok(false);
        }
        self.write_durable(&next)?;
        *live = next;
        Ok(true)
    }
}
