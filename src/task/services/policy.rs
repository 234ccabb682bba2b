//! Timing windows for automatic transitions.

use chrono::TimeDelta;
use std::time::Duration;

/// Timing windows the lifecycle engine applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecyclePolicy {
    /// How long a task may stay `ongoing` past its due date before it is
    /// `missed`.
    pub grace_period: TimeDelta,
    /// How long before the due date the reminder fires.
    pub reminder_lead: TimeDelta,
    /// Period of the sweep that re-evaluates every task.
    pub sweep_interval: Duration,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            grace_period: TimeDelta::hours(1),
            reminder_lead: TimeDelta::hours(1),
            sweep_interval: Duration::from_secs(60),
        }
    }
}
