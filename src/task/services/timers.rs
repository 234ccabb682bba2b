//! Bookkeeping for per-task timer handles.
//!
//! Every arming of a task gets a fresh generation. A callback carries the
//! generation it was armed with and must [`TimerRegistry::claim`] its slot
//! before acting, so callbacks from an earlier arming, or for a task that
//! was since moved or deleted, find nothing to claim.

use crate::task::{domain::TaskId, ports::TimerHandle};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TimerKind {
    Due,
    Reminder,
}

#[derive(Debug, Clone, Copy, Default)]
pub(super) struct TaskTimers {
    generation: u64,
    due: Option<TimerHandle>,
    reminder: Option<TimerHandle>,
}

impl TaskTimers {
    pub(super) fn handles(self) -> impl Iterator<Item = TimerHandle> {
        self.due.into_iter().chain(self.reminder)
    }

    const fn is_empty(&self) -> bool {
        self.due.is_none() && self.reminder.is_none()
    }

    fn slot(&mut self, kind: TimerKind) -> &mut Option<TimerHandle> {
        match kind {
            TimerKind::Due => &mut self.due,
            TimerKind::Reminder => &mut self.reminder,
        }
    }
}

#[derive(Debug, Default)]
pub(super) struct TimerRegistry {
    next_generation: u64,
    tasks: HashMap<TaskId, TaskTimers>,
    sweep: Option<TimerHandle>,
}

impl TimerRegistry {
    /// Starts a new arming for `id`, returning its generation and the
    /// timers of the previous arming, which the caller must cancel.
    pub(super) fn begin(&mut self, id: &TaskId) -> (u64, Option<TaskTimers>) {
        self.next_generation += 1;
        let generation = self.next_generation;
        let previous = self.tasks.insert(
            id.clone(),
            TaskTimers {
                generation,
                ..TaskTimers::default()
            },
        );
        (generation, previous)
    }

    pub(super) fn attach(
        &mut self,
        id: &TaskId,
        generation: u64,
        kind: TimerKind,
        handle: TimerHandle,
    ) {
        if let Some(timers) = self.tasks.get_mut(id) {
            if timers.generation == generation {
                *timers.slot(kind) = Some(handle);
            }
        }
    }

    /// Drops an arming that ended up with no timers.
    pub(super) fn discard_if_empty(&mut self, id: &TaskId) {
        if self.tasks.get(id).is_some_and(TaskTimers::is_empty) {
            self.tasks.remove(id);
        }
    }

    /// Takes the `kind` slot of `id` when `generation` is current.
    ///
    /// Returns `false` for stale or already-claimed callbacks.
    pub(super) fn claim(&mut self, id: &TaskId, kind: TimerKind, generation: u64) -> bool {
        let Some(timers) = self.tasks.get_mut(id) else {
            return false;
        };
        if timers.generation != generation {
            return false;
        }
        let claimed = timers.slot(kind).take().is_some();
        if timers.is_empty() {
            self.tasks.remove(id);
        }
        claimed
    }

    pub(super) fn release(&mut self, id: &TaskId) -> Option<TaskTimers> {
        self.tasks.remove(id)
    }

    pub(super) fn release_all(&mut self) -> Vec<TimerHandle> {
        self.tasks
            .drain()
            .flat_map(|(_, timers)| timers.handles())
            .collect()
    }

    pub(super) fn has_pending(&self, id: &TaskId) -> bool {
        self.tasks.get(id).is_some_and(|timers| !timers.is_empty())
    }

    pub(super) const fn sweep(&self) -> Option<TimerHandle> {
        self.sweep
    }

    pub(super) fn set_sweep(&mut self, handle: Option<TimerHandle>) -> Option<TimerHandle> {
        std::mem::replace(&mut self.sweep, handle)
    }
}
