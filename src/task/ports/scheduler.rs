//! Scheduler port for one-shot and repeating timers.

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Callback run once when a one-shot timer fires.
pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Callback run on every tick of a repeating timer.
pub type RepeatingCallback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Result type for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;

/// Opaque handle identifying a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl TimerHandle {
    /// Wraps a scheduler-assigned sequence number.
    #[must_use]
    pub const fn new(sequence: u64) -> Self {
        Self(sequence)
    }

    /// Returns the sequence number.
    #[must_use]
    pub const fn sequence(self) -> u64 {
        self.0
    }
}

/// Timer scheduling contract.
///
/// Cancelling a timer strictly before its fire time guarantees the callback
/// does not run. A callback never runs twice for one firing, and cancelling
/// twice reports success at most once.
pub trait Scheduler: Send + Sync {
    /// Runs `callback` once, no sooner than `delay` from now.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::RuntimeUnavailable`] when the backing
    /// runtime has shut down.
    fn after(&self, delay: Duration, callback: TimerCallback) -> SchedulerResult<TimerHandle>;

    /// Runs `callback` every `period`, first after one full period.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::ZeroPeriod`] for a zero period,
    /// [`SchedulerError::PeriodTooLong`] when the first tick cannot be
    /// represented, or [`SchedulerError::RuntimeUnavailable`] when the
    /// runtime has shut down.
    fn every(&self, period: Duration, callback: RepeatingCallback)
    -> SchedulerResult<TimerHandle>;

    /// Cancels a pending timer.
    ///
    /// Returns `true` when this call prevented future runs, `false` when the
    /// timer already fired, was already cancelled, or is unknown.
    fn cancel(&self, handle: TimerHandle) -> bool;
}

/// Errors returned by scheduler implementations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// The backing runtime is not available.
    #[error("scheduler runtime is unavailable")]
    RuntimeUnavailable,

    /// Repeating timers need a non-zero period.
    #[error("repeating timer period must be non-zero")]
    ZeroPeriod,

    /// The period is too long to schedule a tick for.
    #[error("repeating timer period is too long")]
    PeriodTooLong,
}
