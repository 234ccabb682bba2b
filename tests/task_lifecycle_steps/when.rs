//! When steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, priority};
use chrono::TimeDelta;
use rstest_bdd_macros::when;
use tasktide::task::services::CreateTaskRequest;

#[when("{minutes:i64} minutes pass")]
fn minutes_pass(world: &mut LifecycleWorld, minutes: i64) {
    world.scheduler.advance(TimeDelta::minutes(minutes));
}

#[when("the engine starts")]
fn engine_starts(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    world.engine.start()?;
    Ok(())
}

#[when(r#"a "{level}" priority task "{title}" that fell due {minutes:i64} minutes ago is submitted"#)]
fn submit_past_task(
    world: &mut LifecycleWorld,
    level: String,
    title: String,
    minutes: i64,
) -> Result<(), eyre::Report> {
    let due = world.now() - TimeDelta::minutes(minutes);
    match world
        .engine
        .create_task(CreateTaskRequest::new(title, priority(&level)?, due))
    {
        Ok(task) => world.current_task = Some(task),
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}

#[when("the task is deleted")]
fn task_deleted(world: &mut LifecycleWorld) -> Result<(), eyre::Report> {
    let id = world.task()?.id().clone();
    world.engine.delete_task(&id)?;
    Ok(())
}

#[when(r#"the task is moved to "{target}""#)]
fn task_moved(world: &mut LifecycleWorld, target: String) -> Result<(), eyre::Report> {
    let id = world.task()?.id().clone();
    match world.engine.move_task_named(&id, &target) {
        Ok(task) => world.current_task = Some(task),
        Err(err) => world.last_error = Some(err),
    }
    Ok(())
}
