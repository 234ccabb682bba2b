//! Countdown to a task's due date.

use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// How close a due date is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Urgency {
    /// Overdue or due within the hour.
    Critical,
    /// Due within a day.
    Soon,
    /// Due in a day or more.
    Relaxed,
}

/// Remaining time until a due date, broken into whole units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLeft {
    /// The due date has been reached.
    Overdue,
    /// Time remains before the due date.
    Remaining {
        /// Whole days left.
        days: i64,
        /// Whole hours left after days.
        hours: i64,
        /// Whole minutes left after hours.
        minutes: i64,
        /// Urgency bucket for the remaining time.
        urgency: Urgency,
    },
}

impl TimeLeft {
    /// Computes the countdown from `now` to `due_date`.
    #[must_use]
    pub fn until(due_date: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let remaining = due_date.signed_duration_since(now);
        if remaining <= TimeDelta::zero() {
            return Self::Overdue;
        }

        let days = remaining.num_days();
        let after_days = remaining - TimeDelta::days(days);
        let hours = after_days.num_hours();
        let minutes = (after_days - TimeDelta::hours(hours)).num_minutes();

        let urgency = if remaining < TimeDelta::hours(1) {
            Urgency::Critical
        } else if remaining < TimeDelta::days(1) {
            Urgency::Soon
        } else {
            Urgency::Relaxed
        };

        Self::Remaining {
            days,
            hours,
            minutes,
            urgency,
        }
    }

    /// Returns the urgency bucket; overdue counts as critical.
    #[must_use]
    pub const fn urgency(self) -> Urgency {
        match self {
            Self::Overdue => Urgency::Critical,
            Self::Remaining { urgency, .. } => urgency,
        }
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Overdue => f.write_str("Overdue!"),
            Self::Remaining {
                days,
                hours,
                minutes,
                ..
            } => {
                if days > 0 {
                    write!(f, "{days}d ")?;
                }
                if hours > 0 || days > 0 {
                    write!(f, "{hours}h ")?;
                }
                write!(f, "{minutes}m")
            }
        }
    }
}
