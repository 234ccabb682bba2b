//! Shared fixtures for in-memory integration tests.

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use mockall::mock;
use rstest::fixture;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tasktide::api::TaskApi;
use tasktide::task::{
    adapters::memory::{
        InMemoryTaskStore, ManualClock, ManualScheduler, RecordingListener, RecordingNotifier,
    },
    domain::{Priority, Task, TaskCollection, TaskDraft, TaskId},
    ports::{LoadOutcome, TaskStore, TaskStoreResult},
    services::{LifecycleEngine, LifecyclePolicy},
};

mock! {
    /// Scriptable task store.
    pub Store {}

    impl TaskStore for Store {
        fn load(&self) -> TaskStoreResult<LoadOutcome>;
        fn save(&self, tasks: &TaskCollection) -> TaskStoreResult<()>;
        fn list(&self) -> TaskStoreResult<TaskCollection>;
        fn get(&self, id: &TaskId) -> TaskStoreResult<Option<Task>>;
        fn upsert(&self, task: &Task) -> TaskStoreResult<()>;
        fn remove(&self, id: &TaskId) -> TaskStoreResult<Option<Task>>;
    }
}

/// Engine type wired to the deterministic adapters.
pub type TestEngine =
    LifecycleEngine<InMemoryTaskStore, ManualScheduler, RecordingNotifier, ManualClock>;

/// Facade type over the in-memory store.
pub type TestApi = TaskApi<InMemoryTaskStore, ManualClock>;

/// Provides the instant every test starts at.
#[fixture]
pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, 20, 7, 30, 0)
        .single()
        .expect("valid start instant")
}

/// Provides a manual clock reading [`start`].
#[fixture]
pub fn clock(start: DateTime<Utc>) -> ManualClock {
    ManualClock::new(start)
}

/// Builds a draft due `due_in` after `now`.
pub fn draft_due_in(title: &str, now: DateTime<Utc>, due_in: TimeDelta) -> TaskDraft {
    TaskDraft::new(title, "", Priority::Medium, now + due_in)
}

/// Counts change hook invocations.
#[derive(Clone, Default)]
pub struct ChangeCounter(Arc<AtomicUsize>);

impl ChangeCounter {
    /// Returns the number of recorded changes.
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    /// Builds a hook that increments this counter.
    pub fn hook(&self) -> Arc<dyn Fn() + Send + Sync> {
        let counter = Arc::clone(&self.0);
        Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }
}

/// Engine and API sharing one store, wired like the server binary.
pub struct Wiring {
    pub engine: TestEngine,
    pub api: TestApi,
    pub scheduler: ManualScheduler,
    pub notifier: Arc<RecordingNotifier>,
    pub listener: Arc<RecordingListener>,
}

/// Provides a started engine whose timers follow API writes.
#[fixture]
pub fn wiring(clock: ManualClock) -> Wiring {
    let store = Arc::new(InMemoryTaskStore::new());
    let scheduler = ManualScheduler::new(clock.clone());
    let notifier = Arc::new(RecordingNotifier::new());
    let listener = Arc::new(RecordingListener::new());
    let engine = LifecycleEngine::new(
        Arc::clone(&store),
        Arc::new(scheduler.clone()),
        Arc::clone(&notifier),
        Arc::new(clock.clone()),
        LifecyclePolicy::default(),
    );
    engine.subscribe(listener.clone());
    engine.start().expect("start engine");

    let reload_engine = engine.clone();
    let api = TaskApi::new(store, Arc::new(clock)).with_change_hook(Arc::new(move || {
        reload_engine.reload().expect("reload engine");
    }));

    Wiring {
        engine,
        api,
        scheduler,
        notifier,
        listener,
    }
}

/// Write performed by another writer in the middle of an engine operation.
type PendingWrite = Box<dyn FnOnce() + Send>;

/// Store that lets a second writer commit after each read and before each
/// read-modify-write, as a concurrent HTTP request on the shared store would.
pub struct InterleavingStore {
    inner: Arc<InMemoryTaskStore>,
    pending: Mutex<Option<PendingWrite>>,
}

impl InterleavingStore {
    /// Wraps `inner`; the second writer should target `inner` directly.
    pub fn new(inner: Arc<InMemoryTaskStore>) -> Self {
        Self {
            inner,
            pending: Mutex::new(None),
        }
    }

    /// Queues `write` to run once, at the next interleaving point.
    pub fn interleave(&self, write: impl FnOnce() + Send + 'static) {
        *self.pending.lock().expect("pending write lock") = Some(Box::new(write));
    }

    /// Returns whether the queued write has run.
    pub fn interleaved(&self) -> bool {
        self.pending.lock().expect("pending write lock").is_none()
    }

    fn run_pending(&self) {
        let pending = self.pending.lock().expect("pending write lock").take();
        if let Some(write) = pending {
            write();
        }
    }
}

impl TaskStore for InterleavingStore {
    fn load(&self) -> TaskStoreResult<LoadOutcome> {
        self.inner.load()
    }

    fn save(&self, tasks: &TaskCollection) -> TaskStoreResult<()> {
        self.inner.save(tasks)
    }

    fn list(&self) -> TaskStoreResult<TaskCollection> {
        let tasks = self.inner.list();
        self.run_pending();
        tasks
    }

    fn get(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        let task = self.inner.get(id);
        self.run_pending();
        task
    }

    fn upsert(&self, task: &Task) -> TaskStoreResult<()> {
        self.inner.upsert(task)
    }

    fn remove(&self, id: &TaskId) -> TaskStoreResult<Option<Task>> {
        self.inner.remove(id)
    }

    fn update(
        &self,
        edit: &mut dyn FnMut(&mut TaskCollection) -> bool,
    ) -> TaskStoreResult<bool> {
        self.run_pending();
        self.inner.update(edit)
    }
}

/// Builds an unstarted engine over `store` driven by `clock`.
pub fn engine_over<S: TaskStore + 'static>(
    store: Arc<S>,
    clock: &ManualClock,
) -> LifecycleEngine<S, ManualScheduler, RecordingNotifier, ManualClock> {
    LifecycleEngine::new(
        store,
        Arc::new(ManualScheduler::new(clock.clone())),
        Arc::new(RecordingNotifier::new()),
        Arc::new(clock.clone()),
        LifecyclePolicy::default(),
    )
}
