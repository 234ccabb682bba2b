//! Observer port for committed lifecycle events.

use crate::task::domain::LifecycleEvent;

/// Receives lifecycle events after the engine has committed them.
///
/// Listeners are called outside the engine's operation lock and may call
/// back into the engine.
pub trait LifecycleListener: Send + Sync {
    /// Handles one event.
    fn on_event(&self, event: &LifecycleEvent);
}

impl<F> LifecycleListener for F
where
    F: Fn(&LifecycleEvent) + Send + Sync,
{
    fn on_event(&self, event: &LifecycleEvent) {
        self(event);
    }
}
