//! Deterministic scheduler driven by a [`ManualClock`].

use super::ManualClock;
use crate::task::ports::{
    RepeatingCallback, Scheduler, SchedulerError, SchedulerResult, TimerCallback, TimerHandle,
};
use chrono::{DateTime, TimeDelta, Utc};
use std::collections::{BTreeMap, HashMap};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tracing::error;

/// Scheduler whose timers fire only when [`ManualScheduler::advance`] moves
/// simulated time past them.
///
/// Timers due at the same instant fire in the order they were scheduled.
/// Clones share the same timer queue.
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    state: Arc<Mutex<ManualSchedulerState>>,
}

#[derive(Default)]
struct ManualSchedulerState {
    next_sequence: u64,
    queue: BTreeMap<QueueKey, Queued>,
    index: HashMap<TimerHandle, QueueKey>,
}

type QueueKey = (DateTime<Utc>, u64);

struct Queued {
    handle: TimerHandle,
    action: Action,
}

enum Action {
    Once(TimerCallback),
    Repeating {
        period: TimeDelta,
        callback: RepeatingCallback,
    },
}

enum Firing {
    Once(TimerCallback),
    Repeating(RepeatingCallback),
}

impl ManualSchedulerState {
    fn next_key(&mut self, at: DateTime<Utc>) -> QueueKey {
        self.next_sequence += 1;
        (at, self.next_sequence)
    }

    fn enqueue(&mut self, handle: TimerHandle, at: DateTime<Utc>, action: Action) {
        let key = self.next_key(at);
        self.queue.insert(key, Queued { handle, action });
        self.index.insert(handle, key);
    }

    fn pop_due(&mut self, target: DateTime<Utc>) -> Option<(DateTime<Utc>, Firing)> {
        let key = *self.queue.keys().next()?;
        if key.0 > target {
            return None;
        }
        let queued = self.queue.remove(&key)?;
        self.index.remove(&queued.handle);
        let firing = match queued.action {
            Action::Once(callback) => Firing::Once(callback),
            Action::Repeating { period, callback } => {
                let next_at = key.0 + period;
                self.enqueue(
                    queued.handle,
                    next_at,
                    Action::Repeating {
                        period,
                        callback: Arc::clone(&callback),
                    },
                );
                Firing::Repeating(callback)
            }
        };
        Some((key.0, firing))
    }
}

impl ManualScheduler {
    /// Creates a scheduler reading and moving `clock`.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            state: Arc::default(),
        }
    }

    /// Returns the clock this scheduler moves.
    #[must_use]
    pub const fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Moves simulated time forward by `delta`, firing every timer that
    /// comes due on the way in time order.
    ///
    /// The clock reads each timer's fire time while its callback runs, and
    /// the final target afterwards. Timers scheduled by callbacks fire in
    /// the same call if they fall due before the target.
    pub fn advance(&self, delta: TimeDelta) {
        let target = self.clock.now() + delta;
        loop {
            let due = self.lock().pop_due(target);
            let Some((at, firing)) = due else {
                break;
            };
            self.clock.set(at);
            let outcome = catch_unwind(AssertUnwindSafe(|| match firing {
                Firing::Once(callback) => callback(),
                Firing::Repeating(callback) => callback(),
            }));
            if outcome.is_err() {
                error!(fire_time = %at, "scheduled callback panicked");
            }
        }
        self.clock.set(target);
    }

    /// Fires timers already due without moving time.
    pub fn run_due(&self) {
        self.advance(TimeDelta::zero());
    }

    /// Number of timers waiting to fire.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.lock().queue.len()
    }

    /// Returns whether `handle` is still waiting to fire.
    #[must_use]
    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.lock().index.contains_key(&handle)
    }

    /// Returns the earliest pending fire time.
    #[must_use]
    pub fn next_fire_time(&self) -> Option<DateTime<Utc>> {
        self.lock().queue.keys().next().map(|key| key.0)
    }

    fn lock(&self) -> MutexGuard<'_, ManualSchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn fire_time(&self, delay: Duration) -> DateTime<Utc> {
        let offset = TimeDelta::from_std(delay).unwrap_or(TimeDelta::MAX);
        self.clock
            .now()
            .checked_add_signed(offset)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}

impl Scheduler for ManualScheduler {
    fn after(&self, delay: Duration, callback: TimerCallback) -> SchedulerResult<TimerHandle> {
        let at = self.fire_time(delay);
        let mut state = self.lock();
        let handle = TimerHandle::new(state.next_sequence + 1);
        state.enqueue(handle, at, Action::Once(callback));
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
        let step = TimeDelta::from_std(period).unwrap_or(TimeDelta::MAX);
        let at = self.fire_time(period);
        let mut state = self.lock();
        let handle = TimerHandle::new(state.next_sequence + 1);
        state.enqueue(
            handle,
            at,
            Action::Repeating {
                period: step,
                callback,
            },
        );
        Ok(handle)
    }

    fn cancel(&self, handle: TimerHandle) -> bool {
        let mut state = self.lock();
        let Some(key) = state.index.remove(&handle) else {
            return false;
        };
        state.queue.remove(&key).is_some()
    }
}
