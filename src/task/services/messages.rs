//! User-facing notification text.

use crate::task::domain::TaskTitle;
use chrono::TimeDelta;

pub(super) const CREATED: &str = "Task created successfully!";
pub(super) const COMPLETED: &str = "Task completed!";
pub(super) const DELETED: &str = "Task deleted.";
pub(super) const UPDATED: &str = "Task updated successfully!";
pub(super) const CORRUPT_DATA: &str = "Saved tasks could not be read; starting with an empty list.";
pub(super) const ACTIVATED_BODY: &str = "Your task is now active and needs attention.";

pub(super) fn activated(title: &TaskTitle) -> String {
    format!("Task \"{title}\" is now active!")
}

pub(super) fn activated_os_title(title: &TaskTitle) -> String {
    format!("Task started: {title}")
}

pub(super) fn reminder(title: &TaskTitle, lead: TimeDelta) -> String {
    format!("Task \"{title}\" is due in {}!", describe_lead(lead))
}

pub(super) fn reminder_os_title(title: &TaskTitle) -> String {
    format!("Task reminder: {title}")
}

pub(super) fn reminder_body(lead: TimeDelta) -> String {
    format!("This task is due in {}.", describe_lead(lead))
}

pub(super) fn missed(title: &TaskTitle) -> String {
    format!("Task \"{title}\" has been missed!")
}

/// "1 hour", "2 hours", "1 minute", "90 minutes".
fn describe_lead(lead: TimeDelta) -> String {
    let hours = lead.num_hours();
    if lead == TimeDelta::hours(hours) {
        return plural(hours, "hour");
    }
    plural(lead.num_minutes(), "minute")
}

fn plural(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit}")
    } else {
        format!("{count} {unit}s")
    }
}
