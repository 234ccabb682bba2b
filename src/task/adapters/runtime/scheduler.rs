//! Scheduler backed by tokio timers.

use crate::task::ports::{
    RepeatingCallback, Scheduler, SchedulerError, SchedulerResult, TimerCallback, TimerHandle,
};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error};

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Scheduler spawning one tokio task per timer.
///
/// Callbacks run on the blocking pool so they may perform synchronous I/O.
/// A panicking callback is logged and does not affect other timers. Once the
/// runtime has shut down, scheduling fails with
/// [`SchedulerError::RuntimeUnavailable`].
#[derive(Clone)]
pub struct TokioScheduler {
    runtime: Handle,
    table: Arc<Mutex<TimerTable>>,
}

#[derive(Default)]
struct TimerTable {
    next_sequence: u64,
    slots: HashMap<TimerHandle, TimerSlot>,
}

struct TimerSlot {
    state: Arc<AtomicU8>,
    task: JoinHandle<()>,
}

impl TimerTable {
    fn allocate(&mut self) -> TimerHandle {
        self.next_sequence += 1;
        TimerHandle::new(self.next_sequence)
    }
}

impl TokioScheduler {
    /// Creates a scheduler spawning onto `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            table: Arc::default(),
        }
    }

    /// Creates a scheduler for the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::RuntimeUnavailable`] outside a tokio
    /// runtime.
    pub fn current() -> SchedulerResult<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|_| SchedulerError::RuntimeUnavailable)
    }

    /// Number of timers that have neither fired nor been cancelled.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        lock(&self.table).slots.len()
    }

    /// Cancels every pending timer.
    pub fn cancel_all(&self) {
        let slots: Vec<TimerSlot> = lock(&self.table).slots.drain().map(|(_, slot)| slot).collect();
        for slot in slots {
            if slot
                .state
                .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                slot.task.abort();
            }
        }
    }
}

/// Tracks whether a spawned timer future was polled before being dropped.
///
/// A shut-down runtime drops spawned futures inside `spawn` without
/// polling them.
#[derive(Default)]
struct Launch {
    polled: AtomicBool,
    dropped: AtomicBool,
}

impl Launch {
    fn refused(&self) -> bool {
        self.dropped.load(Ordering::SeqCst) && !self.polled.load(Ordering::SeqCst)
    }
}

struct LaunchGuard(Arc<Launch>);

impl LaunchGuard {
    fn polled(&self) {
        self.0.polled.store(true, Ordering::SeqCst);
    }
}

impl Drop for LaunchGuard {
    fn drop(&mut self) {
        self.0.dropped.store(true, Ordering::SeqCst);
    }
}

fn spawn_timer(
    runtime: &Handle,
    timer: impl Future<Output = ()> + Send + 'static,
) -> SchedulerResult<JoinHandle<()>> {
    let launch = Arc::new(Launch::default());
    let guard = LaunchGuard(Arc::clone(&launch));
    let task = runtime.spawn(async move {
        guard.polled();
        timer.await;
        drop(guard);
    });
    if launch.refused() {
        debug!("timer refused by a shut-down runtime");
        return Err(SchedulerError::RuntimeUnavailable);
    }
    Ok(task)
}

fn lock(table: &Mutex<TimerTable>) -> MutexGuard<'_, TimerTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

fn forget(table: &Weak<Mutex<TimerTable>>, handle: TimerHandle) {
    if let Some(table) = table.upgrade() {
        lock(&table).slots.remove(&handle);
    }
}

async fn run_blocking(handle: TimerHandle, callback: impl FnOnce() + Send + 'static) {
    if let Err(err) = tokio::task::spawn_blocking(callback).await {
        if err.is_panic() {
            error!(timer = handle.sequence(), "scheduled callback panicked");
        } else {
            debug!(timer = handle.sequence(), "scheduled callback was cancelled");
        }
    }
}

impl Scheduler for TokioScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> SchedulerResult<TimerHandle> {
        let mut table = lock(&self.table);
        let handle = table.allocate();
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);
        let weak_table = Arc::downgrade(&self.table);

        let task = spawn_timer(&self.runtime, async move {
            tokio::time::sleep(delay).await;
            if task_state
                .compare_exchange(PENDING, FIRED, Ordering::SeqCst, Ordering::SeqCst)
                .is_err()
            {
                return;
            }
            forget(&weak_table, handle);
            run_blocking(handle, callback).await;
        })?;

        table.slots.insert(handle, TimerSlot { state, task });
        Ok(handle)
    }

    fn every(
        &self,
        period: Duration,
        callback: RepeatingCallback,
    ) -> SchedulerResult<TimerHandle> {
        if period.is_zero() {
            return Err(SchedulerError::ZeroPeriod);
        }
        let first_tick = Instant::now()
            .checked_add(period)
            .ok_or(SchedulerError::PeriodTooLong)?;
        let mut table = lock(&self.table);
        let handle = table.allocate();
        let state = Arc::new(AtomicU8::new(PENDING));
        let task_state = Arc::clone(&state);

        let task = spawn_timer(&self.runtime, async move {
            let mut ticker = tokio::time::interval_at(first_tick, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if task_state.load(Ordering::SeqCst) != PENDING {
                    break;
                }
                let tick = Arc::clone(&callback);
                run_blocking(handle, move || tick()).await;
            }
        })?;

        table.slots.insert(handle, TimerSlot { state, task });
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let Some(slot) = lock(&self.table).slots.remove(&handle) else {
            return false;
        };
        let cancelled = slot
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok();
        if cancelled {
            slot.task.abort();
        }
        cancelled
    }
}
