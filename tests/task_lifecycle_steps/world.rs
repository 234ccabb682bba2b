//! Shared world state for task lifecycle BDD scenarios.

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use rstest::fixture;
use tasktide::task::{
    adapters::memory::{
        InMemoryTaskStore, ManualClock, ManualScheduler, RecordingListener, RecordingNotifier,
    },
    domain::{LifecycleEvent, Priority, Task},
    services::{LifecycleEngine, LifecycleError, LifecyclePolicy},
};

/// Engine type used by the BDD world.
pub type TestEngine =
    LifecycleEngine<InMemoryTaskStore, ManualScheduler, RecordingNotifier, ManualClock>;

/// Scenario world for task lifecycle behaviour tests.
pub struct LifecycleWorld {
    pub engine: TestEngine,
    pub store: Arc<InMemoryTaskStore>,
    pub scheduler: ManualScheduler,
    pub listener: Arc<RecordingListener>,
    pub current_task: Option<Task>,
    pub last_error: Option<LifecycleError>,
}

impl LifecycleWorld {
    /// Creates a world with an empty store at a fixed instant.
    #[must_use]
    pub fn new() -> Self {
        let clock = ManualClock::new(scenario_start());
        let scheduler = ManualScheduler::new(clock.clone());
        let store = Arc::new(InMemoryTaskStore::new());
        let listener = Arc::new(RecordingListener::new());
        let engine = LifecycleEngine::new(
            Arc::clone(&store),
            Arc::new(scheduler.clone()),
            Arc::new(RecordingNotifier::new()),
            Arc::new(clock),
            LifecyclePolicy::default(),
        );
        engine.subscribe(listener.clone());

        Self {
            engine,
            store,
            scheduler,
            listener,
            current_task: None,
            last_error: None,
        }
    }

    /// Returns the current scenario instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.scheduler.clock().now()
    }

    /// Returns the task the scenario is about.
    ///
    /// # Errors
    ///
    /// Returns an error when no task has been created yet.
    pub fn task(&self) -> Result<&Task, eyre::Report> {
        self.current_task
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }

    /// Counts events matching `predicate`.
    pub fn count_events(&self, predicate: impl Fn(&LifecycleEvent) -> bool) -> usize {
        self.listener
            .events()
            .iter()
            .filter(|event| predicate(event))
            .count()
    }
}

impl Default for LifecycleWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> LifecycleWorld {
    LifecycleWorld::default()
}

/// Parses a priority name used in feature files.
///
/// # Errors
///
/// Returns an error for names that are not priorities.
pub fn priority(name: &str) -> Result<Priority, eyre::Report> {
    Priority::try_from(name).map_err(|err| eyre::eyre!("invalid priority in scenario: {err}"))
}

fn scenario_start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 9, 10, 0, 0)
        .single()
        .expect("valid scenario start")
}
