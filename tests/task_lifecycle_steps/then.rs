//! Then steps for task lifecycle BDD scenarios.

use super::world::LifecycleWorld;
use rstest_bdd_macros::then;
use tasktide::task::domain::{LifecycleEvent, TaskStatus};

#[then(r#"the task is "{status}""#)]
fn task_is(world: &LifecycleWorld, status: String) -> Result<(), eyre::Report> {
    let expected = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid expected status in scenario: {err}"))?;
    let stored = world.engine.task(world.task()?.id())?;

    if stored.status() != expected {
        return Err(eyre::eyre!(
            "expected status {expected}, found {}",
            stored.status()
        ));
    }
    Ok(())
}

#[then("the reminder count is {count:usize}")]
fn reminder_count(world: &LifecycleWorld, count: usize) -> Result<(), eyre::Report> {
    let reminders =
        world.count_events(|event| matches!(event, LifecycleEvent::ReminderDue { .. }));
    eyre::ensure!(
        reminders == count,
        "expected {count} reminders, observed {reminders}"
    );
    Ok(())
}

#[then("no status change was observed")]
fn no_status_change(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let changes =
        world.count_events(|event| matches!(event, LifecycleEvent::StatusChanged { .. }));
    eyre::ensure!(changes == 0, "observed {changes} status changes");
    Ok(())
}

#[then(r#"the operation fails with "{message}""#)]
fn operation_fails_with(world: &LifecycleWorld, message: String) -> Result<(), eyre::Report> {
    let err = world
        .last_error
        .as_ref()
        .ok_or_else(|| eyre::eyre!("expected the operation to fail"))?;
    eyre::ensure!(
        err.to_string() == message,
        "expected error {message:?}, got {err}"
    );
    Ok(())
}

#[then("the board is empty")]
fn board_is_empty(world: &LifecycleWorld) -> Result<(), eyre::Report> {
    let board = world.engine.board()?;
    eyre::ensure!(board.total() == 0, "board holds {} tasks", board.total());
    Ok(())
}
