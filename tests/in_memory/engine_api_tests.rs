//! API writes flowing into a running lifecycle engine.

use super::helpers::{Wiring, draft_due_in, wiring};
use chrono::TimeDelta;
use eyre::{Result, ensure};
use rstest::rstest;
use tasktide::task::{
    domain::{LifecycleEvent, TaskPatch, TaskStatus},
    ports::Severity,
};

#[rstest]
fn tasks_created_through_the_api_get_timers(wiring: Wiring) -> Result<()> {
    let now = wiring.scheduler.clock().now();
    let task = wiring
        .api
        .create(draft_due_in("From API", now, TimeDelta::hours(2)))?;

    ensure!(wiring.engine.has_pending_timers(task.id()));

    wiring.scheduler.advance(TimeDelta::hours(2));

    ensure!(wiring.engine.task(task.id())?.status() == TaskStatus::Ongoing);
    ensure!(
        wiring
            .listener
            .events()
            .iter()
            .any(|event| matches!(event, LifecycleEvent::ReminderDue { task_id, .. } if task_id == task.id()))
    );
    ensure!(wiring.notifier.announcements().contains(&(
        "Task \"From API\" is now active!".to_owned(),
        Severity::Warning
    )));
    Ok(())
}

#[rstest]
fn api_deletes_cancel_engine_timers(wiring: Wiring) -> Result<()> {
    let now = wiring.scheduler.clock().now();
    let task = wiring
        .api
        .create(draft_due_in("Short lived", now, TimeDelta::hours(2)))?;

    wiring.api.delete(&task.id().to_string())?;
    wiring.scheduler.advance(TimeDelta::hours(3));

    ensure!(!wiring.engine.has_pending_timers(task.id()));
    ensure!(wiring.engine.tasks()?.is_empty());
    ensure!(
        !wiring
            .listener
            .events()
            .iter()
            .any(|event| matches!(event, LifecycleEvent::StatusChanged { .. }))
    );
    Ok(())
}

#[rstest]
fn api_status_updates_are_respected_by_the_engine(wiring: Wiring) -> Result<()> {
    let now = wiring.scheduler.clock().now();
    let task = wiring
        .api
        .create(draft_due_in("Done early", now, TimeDelta::hours(2)))?;

    wiring.api.update(
        &task.id().to_string(),
        TaskPatch {
            status: Some(TaskStatus::Completed),
            ..TaskPatch::default()
        },
    )?;
    wiring.scheduler.advance(TimeDelta::hours(4));

    ensure!(wiring.engine.task(task.id())?.status() == TaskStatus::Completed);
    ensure!(wiring.notifier.os_notifications().is_empty());
    Ok(())
}

#[rstest]
fn api_due_date_moved_into_the_past_is_swept(wiring: Wiring) -> Result<()> {
    let now = wiring.scheduler.clock().now();
    let task = wiring
        .api
        .create(draft_due_in("Rescheduled", now, TimeDelta::hours(8)))?;

    wiring.api.update(
        &task.id().to_string(),
        TaskPatch {
            due_date: Some(now - TimeDelta::hours(2)),
            ..TaskPatch::default()
        },
    )?;

    ensure!(wiring.engine.task(task.id())?.status() == TaskStatus::Missed);
    ensure!(!wiring.engine.has_pending_timers(task.id()));
    Ok(())
}
