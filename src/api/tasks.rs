use chrono::Utc;
use tracing::warn;

use crate::store::{NewTaskRow, RemoteStore, StoreResult, TaskPatchRow, TaskRow};
use crate::task::{Task, TaskId, TaskInput, TaskPatch};

/// Every task, newest first. Records without an id are skipped.
pub async fn get_tasks(store: &dyn RemoteStore) -> StoreResult<Vec<Task>> {
    let rows = store.select_tasks().await?;
    let mut tasks = Vec::with_capacity(rows.len());
    for row in rows {
        match row.into_task() {
            Ok(task) => tasks.push(task),
            Err(err) => warn!(error = %err, "skipping store record"),
        }
    }
    Ok(tasks)
}

pub async fn create_task(store: &dyn RemoteStore, input: &TaskInput) -> StoreResult<Task> {
    let row = store.insert_task(NewTaskRow::from(input)).await?;
    row.into_task()
}

/// Send `patch` plus a fresh last-modified stamp. Returns the raw stored row
/// so callers can merge exactly the columns the store echoed back.
pub async fn update_task(
    store: &dyn RemoteStore,
    id: &TaskId,
    patch: &TaskPatch,
) -> StoreResult<TaskRow> {
    store
        .update_task(id, TaskPatchRow::new(patch, Utc::now()))
        .await
}

pub async fn delete_task(store: &dyn RemoteStore, id: &TaskId) -> StoreResult<()> {
    store.delete_task(id).await
}

pub async fn toggle_task_completion(
    store: &dyn RemoteStore,
    id: &TaskId,
    completed: bool,
) -> StoreResult<TaskRow> {
    update_task(store, id, &TaskPatch::completion(completed)).await
}
