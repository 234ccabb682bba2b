//! Engine and API writing to one store at the same time, as the server
//! binary wires them.

use super::helpers::{InterleavingStore, clock, draft_due_in, engine_over, start};
use chrono::{DateTime, TimeDelta, Utc};
use eyre::{Result, ensure};
use rstest::rstest;
use std::sync::Arc;
use tasktide::api::TaskApi;
use tasktide::task::{
    adapters::memory::{InMemoryTaskStore, ManualClock},
    domain::{
        PersistedTaskData, Priority, Task, TaskCollection, TaskId, TaskPatch, TaskStatus,
        TaskTitle,
    },
    ports::TaskStore,
    services::CreateTaskRequest,
};

fn stored_upcoming(title: &str, due_date: DateTime<Utc>) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: TaskId::new(),
        title: TaskTitle::new(title).expect("valid title"),
        description: String::new(),
        priority: Priority::Medium,
        due_date,
        status: TaskStatus::Upcoming,
        created_at: due_date - TimeDelta::days(1),
    })
}

fn titles(store: &InMemoryTaskStore) -> Vec<String> {
    store
        .durable()
        .iter()
        .map(|task| task.title().as_str().to_owned())
        .collect()
}

#[rstest]
fn sweep_keeps_a_task_created_while_it_runs(
    start: DateTime<Utc>,
    clock: ManualClock,
) -> Result<()> {
    let inner = Arc::new(InMemoryTaskStore::new());
    let overdue = stored_upcoming("Engine", start - TimeDelta::hours(2));
    inner.save(&TaskCollection::from_tasks([overdue.clone()]))?;
    let store = Arc::new(InterleavingStore::new(Arc::clone(&inner)));
    let engine = engine_over(Arc::clone(&store), &clock);
    let api = TaskApi::new(Arc::clone(&inner), Arc::new(clock.clone()));
    store.interleave(move || {
        api.create(draft_due_in("From API", start, TimeDelta::hours(3)))
            .expect("create through the API");
    });

    let report = engine.sweep()?;

    ensure!(store.interleaved());
    ensure!(report.transitions.len() == 2);
    ensure!(titles(&inner) == ["Engine", "From API"]);
    ensure!(
        inner.durable().get(overdue.id()).map(Task::status) == Some(TaskStatus::Missed)
    );
    Ok(())
}

#[rstest]
fn manual_move_keeps_fields_updated_while_it_runs(
    start: DateTime<Utc>,
    clock: ManualClock,
) -> Result<()> {
    let inner = Arc::new(InMemoryTaskStore::new());
    let task = stored_upcoming("Shared", start + TimeDelta::hours(4));
    inner.save(&TaskCollection::from_tasks([task.clone()]))?;
    let store = Arc::new(InterleavingStore::new(Arc::clone(&inner)));
    let engine = engine_over(Arc::clone(&store), &clock);
    let api = TaskApi::new(Arc::clone(&inner), Arc::new(clock.clone()));
    let raw_id = task.id().to_string();
    store.interleave(move || {
        api.update(
            &raw_id,
            TaskPatch {
                description: Some("added over HTTP".to_owned()),
                ..TaskPatch::default()
            },
        )
        .expect("update through the API");
    });

    let moved = engine.move_task(task.id(), TaskStatus::Completed)?;

    ensure!(store.interleaved());
    ensure!(moved.description() == "added over HTTP");
    let durable = inner.durable();
    let stored = durable
        .get(task.id())
        .ok_or_else(|| eyre::eyre!("task vanished"))?;
    ensure!(stored.status() == TaskStatus::Completed);
    ensure!(stored.description() == "added over HTTP");
    Ok(())
}

#[rstest]
fn edit_keeps_a_task_created_while_it_runs(
    start: DateTime<Utc>,
    clock: ManualClock,
) -> Result<()> {
    let inner = Arc::new(InMemoryTaskStore::new());
    let original = stored_upcoming("Draft", start + TimeDelta::hours(4));
    inner.save(&TaskCollection::from_tasks([original.clone()]))?;
    let store = Arc::new(InterleavingStore::new(Arc::clone(&inner)));
    let engine = engine_over(Arc::clone(&store), &clock);
    let api = TaskApi::new(Arc::clone(&inner), Arc::new(clock.clone()));
    store.interleave(move || {
        api.create(draft_due_in("From API", start, TimeDelta::hours(3)))
            .expect("create through the API");
    });

    let edited = engine.edit_task(
        original.id(),
        CreateTaskRequest::new("Final", Priority::High, start + TimeDelta::hours(6)),
    )?;

    ensure!(store.interleaved());
    ensure!(titles(&inner) == ["From API", "Final"]);
    ensure!(inner.durable().contains(edited.id()));
    ensure!(!inner.durable().contains(original.id()));
    Ok(())
}

#[rstest]
fn writes_from_parallel_threads_are_all_kept(
    start: DateTime<Utc>,
    clock: ManualClock,
) -> Result<()> {
    let store = Arc::new(InMemoryTaskStore::new());
    let engine = engine_over(Arc::clone(&store), &clock);
    let own = engine.create_task(CreateTaskRequest::new(
        "Engine",
        Priority::High,
        start + TimeDelta::hours(5),
    ))?;
    let api = TaskApi::new(Arc::clone(&store), Arc::new(clock.clone()));

    let writer = std::thread::spawn(move || -> Result<Vec<TaskId>> {
        (0..25)
            .map(|n| {
                let task = api.create(draft_due_in(
                    &format!("API {n}"),
                    start,
                    TimeDelta::hours(3),
                ))?;
                Ok(task.id().clone())
            })
            .collect()
    });
    for target in [TaskStatus::Completed, TaskStatus::Upcoming]
        .into_iter()
        .cycle()
        .take(25)
    {
        engine.move_task(own.id(), target)?;
        engine.sweep()?;
    }
    let created = writer
        .join()
        .map_err(|_| eyre::eyre!("API writer panicked"))??;

    let durable = store.durable();
    ensure!(durable.len() == 26);
    ensure!(created.iter().all(|id| durable.contains(id)));
    ensure!(durable.get(own.id()).map(Task::status) == Some(TaskStatus::Completed));
    Ok(())
}
