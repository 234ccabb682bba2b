//! CRUD behaviour of the task API facade.

use super::helpers::{ChangeCounter, MockStore, TestApi, clock, draft_due_in, start};
use chrono::{DateTime, TimeDelta, Utc};
use eyre::{Result, ensure};
use rstest::{fixture, rstest};
use std::sync::Arc;
use tasktide::api::{ApiError, TaskApi};
use tasktide::task::{
    adapters::memory::{InMemoryTaskStore, ManualClock},
    domain::{Priority, Task, TaskCollection, TaskDomainError, TaskId, TaskPatch, TaskStatus},
    ports::{CorruptDataError, LoadOutcome, TaskStoreError},
};

struct Facade {
    api: TestApi,
    store: Arc<InMemoryTaskStore>,
    changes: ChangeCounter,
    now: DateTime<Utc>,
}

#[fixture]
fn facade(start: DateTime<Utc>, clock: ManualClock) -> Facade {
    let store = Arc::new(InMemoryTaskStore::new());
    let changes = ChangeCounter::default();
    let api = TaskApi::new(Arc::clone(&store), Arc::new(clock)).with_change_hook(changes.hook());
    Facade {
        api,
        store,
        changes,
        now: start,
    }
}

fn io_failure() -> TaskStoreError {
    TaskStoreError::persistence(std::io::Error::other("disk unavailable"))
}

#[rstest]
fn created_tasks_are_listed(facade: Facade) -> Result<()> {
    let created = facade
        .api
        .create(draft_due_in("Plan week", facade.now, TimeDelta::days(1)))?;

    let listed = facade.api.list()?;

    ensure!(listed == [created.clone()]);
    ensure!(created.status() == TaskStatus::Upcoming);
    ensure!(created.created_at() == facade.now);
    ensure!(facade.changes.count() == 1);
    Ok(())
}

#[rstest]
fn creation_validates_before_touching_the_store(facade: Facade) -> Result<()> {
    let result = facade
        .api
        .create(draft_due_in("Late", facade.now, TimeDelta::zero()));

    ensure!(matches!(
        result,
        Err(ApiError::Validation(TaskDomainError::DueDateNotInFuture { .. }))
    ));
    ensure!(facade.store.save_count() == 0);
    ensure!(facade.changes.count() == 0);
    Ok(())
}

#[rstest]
fn update_merges_only_the_given_fields(facade: Facade) -> Result<()> {
    let created = facade
        .api
        .create(draft_due_in("Read", facade.now, TimeDelta::hours(6)))?;
    let earlier = facade.now - TimeDelta::hours(1);

    let updated = facade.api.update(
        &created.id().to_string(),
        TaskPatch {
            due_date: Some(earlier),
            status: Some(TaskStatus::Ongoing),
            ..TaskPatch::default()
        },
    )?;

    ensure!(updated.id() == created.id());
    ensure!(updated.title() == created.title());
    ensure!(updated.due_date() == earlier);
    ensure!(updated.status() == TaskStatus::Ongoing);
    ensure!(facade.store.durable().get(created.id()) == Some(&updated));
    Ok(())
}

#[rstest]
fn blank_title_update_changes_nothing(facade: Facade) -> Result<()> {
    let created = facade
        .api
        .create(draft_due_in("Keep", facade.now, TimeDelta::hours(6)))?;

    let result = facade.api.update(
        &created.id().to_string(),
        TaskPatch {
            title: Some("   ".to_owned()),
            priority: Some(Priority::Low),
            ..TaskPatch::default()
        },
    );

    ensure!(matches!(
        result,
        Err(ApiError::Validation(TaskDomainError::EmptyTitle))
    ));
    ensure!(facade.api.list()? == [created]);
    ensure!(facade.changes.count() == 1);
    Ok(())
}

#[rstest]
#[case("not-a-uuid")]
#[case("")]
fn unknown_and_blank_ids_are_not_found(facade: Facade, #[case] id: &str) {
    assert!(matches!(
        facade.api.update(id, TaskPatch::default()),
        Err(ApiError::NotFound)
    ));
    assert!(matches!(facade.api.delete(id), Err(ApiError::NotFound)));
}

#[rstest]
fn delete_removes_once(facade: Facade) -> Result<()> {
    let created = facade
        .api
        .create(draft_due_in("Bin", facade.now, TimeDelta::hours(1)))?;
    let id = created.id().to_string();

    facade.api.delete(&id)?;

    ensure!(matches!(facade.api.delete(&id), Err(ApiError::NotFound)));
    ensure!(facade.api.list()?.is_empty());
    ensure!(facade.changes.count() == 2);
    Ok(())
}

#[rstest]
fn unreadable_store_fails_list(clock: ManualClock) {
    let mut store = MockStore::new();
    store
        .expect_load()
        .returning(|| Ok(LoadOutcome::corrupt(CorruptDataError::new("trailing comma"))));
    store.expect_list().never();
    let api = TaskApi::new(Arc::new(store), Arc::new(clock));

    let result = api.list();

    assert!(matches!(result, Err(ApiError::ReadFailed(_))));
    assert_eq!(
        result.err().map(|err| err.to_string()),
        Some("Failed to read tasks".to_owned())
    );
}

#[rstest]
fn failed_write_is_reported_without_running_the_hook(
    start: DateTime<Utc>,
    clock: ManualClock,
) {
    let mut store = MockStore::new();
    store
        .expect_load()
        .returning(|| Ok(LoadOutcome::default()));
    store.expect_upsert().times(1).returning(|_| Err(io_failure()));
    let changes = ChangeCounter::default();
    let api = TaskApi::new(Arc::new(store), Arc::new(clock)).with_change_hook(changes.hook());

    let result = api.create(draft_due_in("Unsaved", start, TimeDelta::hours(2)));

    assert!(matches!(result, Err(ApiError::CreateFailed(_))));
    assert_eq!(changes.count(), 0);
}

#[rstest]
fn failed_delete_maps_to_delete_failed(clock: ManualClock) {
    let mut store = MockStore::new();
    store
        .expect_load()
        .returning(|| Ok(LoadOutcome::default()));
    store.expect_remove().returning(|_| Err(io_failure()));
    let api = TaskApi::new(Arc::new(store), Arc::new(clock));

    let result = api.delete(&TaskId::new().to_string());

    assert!(matches!(result, Err(ApiError::DeleteFailed(_))));
}

#[rstest]
fn failed_update_maps_to_update_failed(start: DateTime<Utc>, clock: ManualClock) -> Result<()> {
    let stored = Task::create(draft_due_in("Stored", start, TimeDelta::hours(3)), &clock)?;
    let id = stored.id().to_string();
    let mut store = MockStore::new();
    store
        .expect_load()
        .returning(|| Ok(LoadOutcome::default()));
    store
        .expect_list()
        .returning(move || Ok(TaskCollection::from_tasks([stored.clone()])));
    store.expect_save().times(1).returning(|_| Err(io_failure()));
    let changes = ChangeCounter::default();
    let api = TaskApi::new(Arc::new(store), Arc::new(clock)).with_change_hook(changes.hook());

    let result = api.update(
        &id,
        TaskPatch {
            priority: Some(Priority::High),
            ..TaskPatch::default()
        },
    );

    ensure!(matches!(result, Err(ApiError::UpdateFailed(_))));
    ensure!(changes.count() == 0);
    Ok(())
}
