//! Port contracts for the task lifecycle engine.
//!
//! Ports define infrastructure-agnostic interfaces used by task services:
//! durable storage, timer scheduling, user notification and observation of
//! committed lifecycle events.

pub mod listener;
pub mod notifier;
pub mod scheduler;
pub mod store;

pub use listener::LifecycleListener;
pub use notifier::{Notifier, Severity};
pub use scheduler::{
    RepeatingCallback, Scheduler, SchedulerError, SchedulerResult, TimerCallback, TimerHandle,
};
pub use store::{CorruptDataError, LoadOutcome, TaskStore, TaskStoreError, TaskStoreResult};
