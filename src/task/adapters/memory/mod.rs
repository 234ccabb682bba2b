//! In-memory adapters for deterministic lifecycle tests.
//!
//! [`ManualClock`] and [`ManualScheduler`] share one notion of "now": the
//! scheduler fires due timers in order while moving the clock forward, so
//! tests can simulate hours passing without waiting.

mod clock;
mod listener;
mod notifier;
mod scheduler;
mod store;

pub use clock::ManualClock;
pub use listener::RecordingListener;
pub use notifier::{Notice, RecordingNotifier};
pub use scheduler::ManualScheduler;
pub use store::InMemoryTaskStore;
