//! Given steps for task lifecycle BDD scenarios.

use super::world::{LifecycleWorld, priority};
use chrono::TimeDelta;
use eyre::WrapErr;
use rstest_bdd_macros::given;
use tasktide::task::{
    domain::{PersistedTaskData, Task, TaskCollection, TaskId, TaskStatus, TaskTitle},
    ports::TaskStore,
    services::CreateTaskRequest,
};

#[given(r#"a "{level}" priority task "{title}" due in {minutes:i64} minutes"#)]
fn task_due_in(
    world: &mut LifecycleWorld,
    level: String,
    title: String,
    minutes: i64,
) -> Result<(), eyre::Report> {
    let due = world.now() + TimeDelta::minutes(minutes);
    let created = world
        .engine
        .create_task(CreateTaskRequest::new(title, priority(&level)?, due))
        .wrap_err("create task for lifecycle scenario")?;
    world.current_task = Some(created);
    Ok(())
}

#[given(r#"a stored "{status}" task "{title}" that fell due {minutes:i64} minutes ago"#)]
fn stored_task(
    world: &mut LifecycleWorld,
    status: String,
    title: String,
    minutes: i64,
) -> Result<(), eyre::Report> {
    let status = TaskStatus::try_from(status.as_str())
        .map_err(|err| eyre::eyre!("invalid status in scenario: {err}"))?;
    let due_date = world.now() - TimeDelta::minutes(minutes);
    let task = Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        title: TaskTitle::new(title)?,
        description: String::new(),
        priority: priority("medium")?,
        due_date,
        status,
        created_at: due_date - TimeDelta::days(1),
    });
    world
        .store
        .save(&TaskCollection::from_tasks([task.clone()]))
        .wrap_err("seed stored task")?;
    world.current_task = Some(task);
    Ok(())
}
