//! Lifecycle engine: task creation, manual moves and time-driven
//! transitions.

use super::effects::Effects;
use super::messages;
use super::policy::LifecyclePolicy;
use super::timers::{TimerKind, TimerRegistry};
use crate::task::{
    domain::{
        LifecycleEvent, Priority, StatusChange, Task, TaskBoard, TaskCollection, TaskDomainError,
        TaskDraft, TaskId, TaskStatus, TransitionCause,
    },
    ports::{
        CorruptDataError, LifecycleListener, Notifier, Scheduler, SchedulerError, Severity,
        TaskStore, TaskStoreError,
    },
};
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Request payload for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    title: String,
    description: String,
    priority: Priority,
    due_date: DateTime<Utc>,
}

impl CreateTaskRequest {
    /// Creates a request with the required fields.
    #[must_use]
    pub fn new(title: impl Into<String>, priority: Priority, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            priority,
            due_date,
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn into_draft(self) -> TaskDraft {
        TaskDraft::new(self.title, self.description, self.priority, self.due_date)
    }
}

impl From<TaskDraft> for CreateTaskRequest {
    fn from(draft: TaskDraft) -> Self {
        Self::new(draft.title, draft.priority, draft.due_date).with_description(draft.description)
    }
}

/// Service-level errors for lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Input validation failed; nothing was changed.
    #[error(transparent)]
    Validation(#[from] TaskDomainError),
    /// The referenced task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// The store rejected the operation; stored state is unchanged.
    #[error(transparent)]
    Store(#[from] TaskStoreError),
    /// A timer could not be scheduled.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}

/// Result type for lifecycle engine operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// A status change the engine applied to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    /// Affected task.
    pub task_id: TaskId,
    /// The change applied.
    pub change: StatusChange,
}

/// Outcome of one sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of tasks evaluated.
    pub evaluated: usize,
    /// Transitions applied, in order.
    pub transitions: Vec<AppliedTransition>,
}

/// Outcome of loading the collection from the store.
#[derive(Debug, Clone, Default)]
pub struct ReloadReport {
    /// Number of tasks loaded.
    pub task_count: usize,
    /// Set when the stored data was unreadable and an empty collection was
    /// used instead.
    pub warning: Option<CorruptDataError>,
    /// Number of tasks with freshly armed timers.
    pub armed: usize,
    /// Transitions that fell due while the collection was not loaded.
    pub sweep: SweepReport,
}

/// Owns the task status state machine and its timers.
///
/// Operations are serialised by an internal operation lock and run to
/// completion. Notifications and listener events are delivered after the
/// lock is released, so listeners may call back into the engine. Clones
/// share the same engine.
pub struct LifecycleEngine<S, T, N, C>
where
    S: TaskStore + 'static,
    T: Scheduler + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    shared: Arc<EngineShared<S, T, N, C>>,
}

impl<S, T, N, C> Clone for LifecycleEngine<S, T, N, C>
where
    S: TaskStore + 'static,
    T: Scheduler + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

struct EngineShared<S, T, N, C> {
    store: Arc<S>,
    scheduler: Arc<T>,
    notifier: Arc<N>,
    clock: Arc<C>,
    policy: LifecyclePolicy,
    timers: Mutex<TimerRegistry>,
    listeners: RwLock<Vec<Arc<dyn LifecycleListener>>>,
}

impl<S, T, N, C> LifecycleEngine<S, T, N, C>
where
    S: TaskStore + 'static,
    T: Scheduler + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    /// Creates an engine. Nothing is loaded or scheduled until
    /// [`Self::start`].
    #[must_use]
    pub fn new(
        store: Arc<S>,
        scheduler: Arc<T>,
        notifier: Arc<N>,
        clock: Arc<C>,
        policy: LifecyclePolicy,
    ) -> Self {
        Self {
            shared: Arc::new(EngineShared {
                store,
                scheduler,
                notifier,
                clock,
                policy,
                timers: Mutex::new(TimerRegistry::default()),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Registers a listener for committed lifecycle events.
    pub fn subscribe(&self, listener: Arc<dyn LifecycleListener>) {
        self.shared
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(listener);
    }

    /// Returns the timing policy in force.
    #[must_use]
    pub fn policy(&self) -> LifecyclePolicy {
        self.shared.policy
    }

    /// Loads the collection, applies overdue transitions, arms per-task
    /// timers and starts the periodic sweep.
    ///
    /// Calling `start` on a running engine reloads without adding a second
    /// sweep timer.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Store`] when the store cannot be read and
    /// [`LifecycleError::Scheduler`] when the sweep cannot be scheduled.
    pub fn start(&self) -> LifecycleResult<ReloadReport> {
        let shared = &self.shared;
        shared.run(|timers, effects| {
            let report = shared.reload_locked(timers, effects)?;
            if timers.sweep().is_none() {
                let handle = shared
                    .scheduler
                    .every(shared.policy.sweep_interval, shared.sweep_callback())?;
                timers.set_sweep(Some(handle));
            }
            info!(
                tasks = report.task_count,
                armed = report.armed,
                "lifecycle engine started"
            );
            Ok(report)
        })
    }

    /// Replaces the collection with the stored copy and re-derives every
    /// timer from the due dates.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Store`] when the store cannot be read.
    pub fn reload(&self) -> LifecycleResult<ReloadReport> {
        let shared = &self.shared;
        shared.run(|timers, effects| shared.reload_locked(timers, effects))
    }

    /// Cancels every timer, including the periodic sweep.
    pub fn shutdown(&self) {
        let mut timers = self.shared.lock_timers();
        let mut handles = timers.release_all();
        handles.extend(timers.set_sweep(None));
        for handle in handles {
            self.shared.scheduler.cancel(handle);
        }
        info!("lifecycle engine stopped");
    }

    /// Validates and persists a new `upcoming` task, then arms its timers.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`] for a blank title or a due
    /// date not strictly in the future, and [`LifecycleError::Store`] when
    /// the save fails. Nothing is changed on error.
    pub fn create_task(&self, request: CreateTaskRequest) -> LifecycleResult<Task> {
        let shared = &self.shared;
        shared.run(|timers, effects| {
            let task = Task::create(request.into_draft(), &*shared.clock)?;
            shared.store.upsert(&task)?;
            shared.arm(timers, &task);
            info!(task_id = %task.id(), due_date = %task.due_date(), "task created");
            effects.announce(messages::CREATED, Severity::Success);
            effects.emit(LifecycleEvent::TaskCreated { task: task.clone() });
            Ok(task)
        })
    }

    /// Marks a task `completed` and cancels its timers.
    ///
    /// Succeeds for any existing task, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] for an unknown id and
    /// [`LifecycleError::Store`] when the save fails.
    pub fn complete_task(&self, id: &TaskId) -> LifecycleResult<Task> {
        let shared = &self.shared;
        shared.run(|timers, effects| {
            let task = shared.move_locked(timers, effects, id, TaskStatus::Completed)?;
            effects.announce(messages::COMPLETED, Severity::Success);
            Ok(task)
        })
    }

    /// Moves a task to `target`, cancelling its pending timers.
    ///
    /// Moving a task back to `upcoming` re-arms its timers from the due
    /// date. Moving a task to the status it already has changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] for an unknown id and
    /// [`LifecycleError::Store`] when the save fails.
    pub fn move_task(&self, id: &TaskId, target: TaskStatus) -> LifecycleResult<Task> {
        let shared = &self.shared;
        shared.run(|timers, effects| shared.move_locked(timers, effects, id, target))
    }

    /// Moves a task to the status named `target`.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`] when `target` is not a known
    /// status, leaving the task untouched; otherwise as
    /// [`Self::move_task`].
    pub fn move_task_named(&self, id: &TaskId, target: &str) -> LifecycleResult<Task> {
        let shared = &self.shared;
        shared.run(|timers, effects| {
            let status = TaskStatus::try_from(target).map_err(TaskDomainError::from)?;
            shared.move_locked(timers, effects, id, status)
        })
    }

    /// Removes a task permanently and cancels its timers.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] for an unknown id and
    /// [`LifecycleError::Store`] when the save fails.
    pub fn delete_task(&self, id: &TaskId) -> LifecycleResult<Task> {
        let shared = &self.shared;
        shared.run(|timers, effects| {
            let removed = shared.delete_locked(timers, effects, id)?;
            effects.announce(messages::DELETED, Severity::Success);
            Ok(removed)
        })
    }

    /// Replaces a task with a new one built from `request`.
    ///
    /// The replacement gets a new id, a new creation time and status
    /// `upcoming`; the old task and its timers are removed. The request is
    /// validated before anything is removed.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`] when the new fields are
    /// invalid, [`LifecycleError::NotFound`] for an unknown id and
    /// [`LifecycleError::Store`] when a save fails.
    pub fn edit_task(&self, id: &TaskId, request: CreateTaskRequest) -> LifecycleResult<Task> {
        let shared = &self.shared;
        shared.run(|timers, effects| {
            let replacement = Task::create(request.into_draft(), &*shared.clock)?;
            let replaced = shared.store.update(&mut |collection: &mut TaskCollection| {
                if collection.remove(id).is_none() {
                    return false;
                }
                collection.upsert(replacement.clone());
                true
            })?;
            if !replaced {
                return Err(LifecycleError::NotFound(id.clone()));
            }

            shared.cancel_task_timers(timers, id);
            shared.arm(timers, &replacement);
            info!(old_id = %id, new_id = %replacement.id(), "task edited");
            effects.announce(messages::UPDATED, Severity::Success);
            effects.emit(LifecycleEvent::TaskDeleted {
                task_id: id.clone(),
            });
            effects.emit(LifecycleEvent::TaskCreated {
                task: replacement.clone(),
            });
            Ok(replacement)
        })
    }

    /// Re-evaluates every task against the clock and applies the automatic
    /// transitions that are due.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Store`] when the collection cannot be read
    /// or saved; no transition is applied in that case.
    pub fn sweep(&self) -> LifecycleResult<SweepReport> {
        let shared = &self.shared;
        shared.run(|timers, effects| shared.sweep_locked(timers, effects))
    }

    /// Returns every task in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Store`] when the store cannot be read.
    pub fn tasks(&self) -> LifecycleResult<Vec<Task>> {
        Ok(self.shared.store.list()?.into_vec())
    }

    /// Returns one task.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::NotFound`] for an unknown id and
    /// [`LifecycleError::Store`] when the store cannot be read.
    pub fn task(&self, id: &TaskId) -> LifecycleResult<Task> {
        self.shared
            .store
            .get(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.clone()))
    }

    /// Returns the tasks grouped into display-ordered buckets.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Store`] when the store cannot be read.
    pub fn board(&self) -> LifecycleResult<TaskBoard> {
        let tasks = self.shared.store.list()?;
        Ok(TaskBoard::from_tasks(&tasks))
    }

    /// Returns whether a due or reminder timer is pending for `id`.
    #[must_use]
    pub fn has_pending_timers(&self, id: &TaskId) -> bool {
        self.shared.lock_timers().has_pending(id)
    }

    /// Returns whether the periodic sweep is scheduled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.shared.lock_timers().sweep().is_some()
    }
}

impl<S, T, N, C> EngineShared<S, T, N, C>
where
    S: TaskStore + 'static,
    T: Scheduler + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    fn lock_timers(&self) -> MutexGuard<'_, TimerRegistry> {
        self.timers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners(&self) -> Vec<Arc<dyn LifecycleListener>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Runs `op` under the operation lock, then delivers its effects.
    /// Failures are announced with error severity.
    fn run<R>(
        &self,
        op: impl FnOnce(&mut TimerRegistry, &mut Effects) -> LifecycleResult<R>,
    ) -> LifecycleResult<R> {
        let mut effects = Effects::default();
        let result = {
            let mut timers = self.lock_timers();
            op(&mut timers, &mut effects)
        };
        if let Err(err) = &result {
            effects.announce(err.to_string(), Severity::Error);
        }
        effects.dispatch(&*self.notifier, &self.listeners());
        result
    }

    fn reload_locked(
        self: &Arc<Self>,
        timers: &mut TimerRegistry,
        effects: &mut Effects,
    ) -> LifecycleResult<ReloadReport> {
        let outcome = self.store.load()?;
        for handle in timers.release_all() {
            self.scheduler.cancel(handle);
        }
        if let Some(warning) = &outcome.warning {
            warn!(error = %warning, "stored tasks unreadable; continuing with none");
            effects.announce(messages::CORRUPT_DATA, Severity::Warning);
        }
        let task_count = outcome.tasks.len();
        effects.emit(LifecycleEvent::TasksReloaded { count: task_count });

        let sweep = self.sweep_locked(timers, effects)?;
        let mut armed = 0;
        for task in &self.store.list()? {
            if self.arm(timers, task) {
                armed += 1;
            }
        }
        debug!(task_count, armed, "task collection reloaded");
        Ok(ReloadReport {
            task_count,
            warning: outcome.warning,
            armed,
            sweep,
        })
    }

    fn move_locked(
        self: &Arc<Self>,
        timers: &mut TimerRegistry,
        effects: &mut Effects,
        id: &TaskId,
        target: TaskStatus,
    ) -> LifecycleResult<Task> {
        let mut outcome = None;
        self.store.update(&mut |collection: &mut TaskCollection| {
            let Some(task) = collection.get_mut(id) else {
                return false;
            };
            let change = task.move_to(target);
            outcome = Some((task.clone(), change));
            change.is_some()
        })?;
        let (task, change) = outcome.ok_or_else(|| LifecycleError::NotFound(id.clone()))?;
        let Some(change) = change else {
            return Ok(task);
        };
        self.cancel_task_timers(timers, id);
        if target == TaskStatus::Upcoming {
            self.arm(timers, &task);
        }
        info!(task_id = %id, from = %change.from, to = %change.to, "task moved");
        effects.emit(status_changed(id, change, TransitionCause::Manual));
        Ok(task)
    }

    fn delete_locked(
        &self,
        timers: &mut TimerRegistry,
        effects: &mut Effects,
        id: &TaskId,
    ) -> LifecycleResult<Task> {
        let removed = self
            .store
            .remove(id)?
            .ok_or_else(|| LifecycleError::NotFound(id.clone()))?;
        self.cancel_task_timers(timers, id);
        info!(task_id = %id, "task deleted");
        effects.emit(LifecycleEvent::TaskDeleted {
            task_id: id.clone(),
        });
        Ok(removed)
    }

    fn sweep_locked(
        &self,
        timers: &mut TimerRegistry,
        effects: &mut Effects,
    ) -> LifecycleResult<SweepReport> {
        let now = self.clock.utc();
        let grace_period = self.policy.grace_period;
        let mut evaluated = 0;
        let mut applied = Vec::new();
        self.store.update(&mut |collection: &mut TaskCollection| {
            evaluated = collection.len();
            applied.clear();
            for task in collection.iter_mut() {
                for change in task.advance_automatically(now, grace_period) {
                    applied.push((task.clone(), change));
                }
            }
            !applied.is_empty()
        })?;

        let mut transitions = Vec::with_capacity(applied.len());
        for (task, change) in applied {
            if change.left_upcoming() {
                self.cancel_task_timers(timers, task.id());
            }
            info!(task_id = %task.id(), from = %change.from, to = %change.to, "sweep transition");
            announce_automatic(effects, &task, change);
            effects.emit(status_changed(task.id(), change, TransitionCause::Sweep));
            transitions.push(AppliedTransition {
                task_id: task.id().clone(),
                change,
            });
        }
        Ok(SweepReport {
            evaluated,
            transitions,
        })
    }

    fn fire_due(
        self: &Arc<Self>,
        timers: &mut TimerRegistry,
        effects: &mut Effects,
        id: &TaskId,
        generation: u64,
    ) -> LifecycleResult<()> {
        if !timers.claim(id, TimerKind::Due, generation) {
            debug!(task_id = %id, "stale due timer ignored");
            return Ok(());
        }
        let now = self.clock.utc();
        let mut outcome = None;
        self.store.update(&mut |collection: &mut TaskCollection| {
            let Some(task) = collection.get_mut(id) else {
                return false;
            };
            let change = task.activate_if_due(now);
            outcome = Some((task.clone(), change));
            change.is_some()
        })?;
        let Some((task, change)) = outcome else {
            return Ok(());
        };
        let Some(change) = change else {
            // Fired early against the wall clock; try again at the due date.
            self.arm(timers, &task);
            return Ok(());
        };
        self.cancel_task_timers(timers, id);
        info!(task_id = %id, "task became active");
        announce_automatic(effects, &task, change);
        effects.emit(status_changed(id, change, TransitionCause::DueTimer));
        Ok(())
    }

    fn fire_reminder(
        &self,
        timers: &mut TimerRegistry,
        effects: &mut Effects,
        id: &TaskId,
        generation: u64,
    ) -> LifecycleResult<()> {
        if !timers.claim(id, TimerKind::Reminder, generation) {
            debug!(task_id = %id, "stale reminder ignored");
            return Ok(());
        }
        let Some(task) = self.store.get(id)? else {
            return Ok(());
        };
        if task.status() != TaskStatus::Upcoming {
            return Ok(());
        }
        let lead = self.policy.reminder_lead;
        effects.announce(messages::reminder(task.title(), lead), Severity::Warning);
        effects.notify_os(
            messages::reminder_os_title(task.title()),
            messages::reminder_body(lead),
        );
        effects.emit(LifecycleEvent::ReminderDue {
            task_id: id.clone(),
            due_date: task.due_date(),
        });
        Ok(())
    }

    /// Arms due and reminder timers for an `upcoming` task that is not yet
    /// due. Returns whether any timer was armed.
    ///
    /// Scheduling failures are logged; the periodic sweep still covers the
    /// task.
    fn arm(self: &Arc<Self>, timers: &mut TimerRegistry, task: &Task) -> bool {
        if task.status() != TaskStatus::Upcoming {
            return false;
        }
        let until_due = task.due_date().signed_duration_since(self.clock.utc());
        if until_due <= TimeDelta::zero() {
            return false;
        }

        let id = task.id();
        let (generation, previous) = timers.begin(id);
        for handle in previous.into_iter().flat_map(|old| old.handles()) {
            self.scheduler.cancel(handle);
        }

        self.schedule(timers, id, generation, TimerKind::Due, until_due);
        let lead = self.policy.reminder_lead;
        if until_due > lead {
            self.schedule(timers, id, generation, TimerKind::Reminder, until_due - lead);
        }
        timers.discard_if_empty(id);
        let armed = timers.has_pending(id);
        debug!(task_id = %id, generation, armed, "timers armed");
        armed
    }

    fn schedule(
        self: &Arc<Self>,
        timers: &mut TimerRegistry,
        id: &TaskId,
        generation: u64,
        kind: TimerKind,
        delay: TimeDelta,
    ) {
        let weak = Arc::downgrade(self);
        let target = id.clone();
        let callback = Box::new(move || fire(&weak, &target, generation, kind));
        match self.scheduler.after(to_std(delay), callback) {
            Ok(handle) => timers.attach(id, generation, kind, handle),
            Err(err) => error!(task_id = %id, ?kind, error = %err, "could not schedule timer"),
        }
    }

    fn sweep_callback(self: &Arc<Self>) -> Arc<dyn Fn() + Send + Sync> {
        let weak = Arc::downgrade(self);
        Arc::new(move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            if let Err(err) = shared.run(|timers, effects| shared.sweep_locked(timers, effects)) {
                error!(error = %err, "periodic sweep failed");
            }
        })
    }

    fn cancel_task_timers(&self, timers: &mut TimerRegistry, id: &TaskId) {
        for handle in timers.release(id).into_iter().flat_map(|old| old.handles()) {
            self.scheduler.cancel(handle);
        }
    }
}

fn fire<S, T, N, C>(
    weak: &Weak<EngineShared<S, T, N, C>>,
    id: &TaskId,
    generation: u64,
    kind: TimerKind,
) where
    S: TaskStore + 'static,
    T: Scheduler + 'static,
    N: Notifier + 'static,
    C: Clock + Send + Sync + 'static,
{
    let Some(shared) = weak.upgrade() else {
        return;
    };
    let result = shared.run(|timers, effects| match kind {
        TimerKind::Due => shared.fire_due(timers, effects, id, generation),
        TimerKind::Reminder => shared.fire_reminder(timers, effects, id, generation),
    });
    if let Err(err) = result {
        error!(task_id = %id, ?kind, error = %err, "timer callback failed");
    }
}

fn announce_automatic(effects: &mut Effects, task: &Task, change: StatusChange) {
    match change.to {
        TaskStatus::Ongoing => {
            effects.announce(messages::activated(task.title()), Severity::Warning);
            effects.notify_os(
                messages::activated_os_title(task.title()),
                messages::ACTIVATED_BODY,
            );
        }
        TaskStatus::Missed => {
            effects.announce(messages::missed(task.title()), Severity::Error);
        }
        TaskStatus::Upcoming | TaskStatus::Completed => {}
    }
}

fn status_changed(id: &TaskId, change: StatusChange, cause: TransitionCause) -> LifecycleEvent {
    LifecycleEvent::StatusChanged {
        task_id: id.clone(),
        from: change.from,
        to: change.to,
        cause,
    }
}

fn to_std(delay: TimeDelta) -> Duration {
    delay.to_std().unwrap_or(Duration::ZERO)
}
