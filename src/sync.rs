//! Task-state synchronization.
//!
//! `TaskSync` owns the in-memory task list for one session and routes every
//! mutation through the remote store. Local state changes only after the
//! store confirms a write; a failed call leaves the list as it was.
//!
//! Loads carry a generation number. A load whose response arrives after a
//! newer load has started is discarded instead of overwriting fresher data.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::api::tasks as api;
use crate::error::{Error, Result};
use crate::notify::Notifier;
use crate::store::RemoteStore;
use crate::task::{Task, TaskId, TaskInput, TaskPatch};

const MSG_LOAD_FAILED: &str = "Could not load tasks";
const MSG_CREATED: &str = "Task created";
const MSG_CREATE_FAILED: &str = "Could not create task";
const MSG_UPDATED: &str = "Task updated";
const MSG_UPDATE_FAILED: &str = "Could not update task";
const MSG_TOGGLED: &str = "Status updated";
const MSG_TOGGLE_FAILED: &str = "Could not update status";
const MSG_DELETED: &str = "Task deleted";
const MSG_DELETE_FAILED: &str = "Could not delete task";
const MSG_BULK_DELETED: &str = "Tasks deleted";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Loading,
    Loaded,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The list was replaced with this many tasks.
    Applied(usize),
    /// A newer load started before this one finished; nothing changed.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub id: TaskId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DeleteOutcome {
    pub fn is_deleted(&self) -> bool {
        self.error.is_none()
    }
}

/// Per-id result of a bulk delete, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDeleteReport {
    pub outcomes: Vec<DeleteOutcome>,
}

impl BulkDeleteReport {
    pub fn deleted(&self) -> Vec<&TaskId> {
        self.outcomes
            .iter()
            .filter(|o| o.is_deleted())
            .map(|o| &o.id)
            .collect()
    }

    pub fn failed(&self) -> Vec<&DeleteOutcome> {
        self.outcomes.iter().filter(|o| !o.is_deleted()).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(DeleteOutcome::is_deleted)
    }

    /// Treat any failed id as a failure of the whole batch.
    pub fn into_result(self) -> Result<Self> {
        if self.is_complete() {
            return Ok(self);
        }
        Err(Error::PartialDelete {
            deleted: self.deleted().iter().map(|id| id.to_string()).collect(),
            failed: self.failed().iter().map(|o| o.id.to_string()).collect(),
        })
    }
}

#[derive(Debug)]
struct SyncState {
    tasks: Vec<Task>,
    status: SyncStatus,
    last_error: Option<String>,
}

pub struct TaskSync {
    store: Arc<dyn RemoteStore>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<SyncState>,
    generation: AtomicU64,
}

impl TaskSync {
    pub fn new(store: Arc<dyn RemoteStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            store,
            notifier,
            state: Mutex::new(SyncState {
                tasks: Vec::new(),
                status: SyncStatus::Loading,
                last_error: None,
            }),
            generation: AtomicU64::new(0),
        }
    }

    pub fn store(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.store)
    }

    /// Snapshot of the local list, newest first.
    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().tasks.clone()
    }

    pub fn get(&self, id: &TaskId) -> Option<Task> {
        self.state.lock().tasks.iter().find(|t| &t.id == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self) -> SyncStatus {
        self.state.lock().status
    }

    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    /// Fetch the full collection and replace the local list.
    ///
    /// On failure the previous list stays in place and the status flips to
    /// `Error`.
    pub async fn load(&self) -> Result<LoadOutcome> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.lock().status = SyncStatus::Loading;
        debug!(generation, "loading tasks");

        let result = api::get_tasks(self.store.as_ref()).await;
        let current = self.generation.load(Ordering::SeqCst) == generation;

        match result {
            Ok(tasks) => {
                if !current {
                    debug!(generation, "discarding superseded load");
                    return Ok(LoadOutcome::Superseded);
                }
                let tasks = dedupe_by_id(tasks);
                let count = tasks.len();
                let mut state = self.state.lock();
                state.tasks = tasks;
                state.status = SyncStatus::Loaded;
                state.last_error = None;
                info!(count, "tasks loaded");
                Ok(LoadOutcome::Applied(count))
            }
            Err(err) => {
                warn!(error = %err, generation, "failed to load tasks");
                if current {
                    let mut state = self.state.lock();
                    state.status = SyncStatus::Error;
                    state.last_error = Some(MSG_LOAD_FAILED.to_string());
                }
                self.notifier.failure(MSG_LOAD_FAILED);
                Err(err.into())
            }
        }
    }

    /// Alias for [`TaskSync::load`].
    pub async fn refresh(&self) -> Result<LoadOutcome> {
        self.load().await
    }

    /// Create a task and put the stored record at the head of the list.
    pub async fn create(&self, input: TaskInput) -> Result<Task> {
        if let Err(err) = input.validate() {
            self.notifier.failure(MSG_CREATE_FAILED);
            return Err(err);
        }

        match api::create_task(self.store.as_ref(), &input).await {
            Ok(task) => {
                {
                    let mut state = self.state.lock();
                    state.tasks.retain(|t| t.id != task.id);
                    state.tasks.insert(0, task.clone());
                }
                info!(task_id = %task.id, "task created");
                self.notifier.success(MSG_CREATED);
                Ok(task)
            }
            Err(err) => {
                warn!(error = %err, "failed to create task");
                self.notifier.failure(MSG_CREATE_FAILED);
                Err(err.into())
            }
        }
    }

    /// Send `patch` and merge the store's answer into the matching entry.
    ///
    /// The id is not checked locally first; the store decides. When the id is
    /// not in the local list the normalized response is returned as is.
    pub async fn update(&self, id: &TaskId, patch: TaskPatch) -> Result<Task> {
        if let Err(err) = patch.validate() {
            self.notifier.failure(MSG_UPDATE_FAILED);
            return Err(err);
        }

        let row = match api::update_task(self.store.as_ref(), id, &patch).await {
            Ok(row) => row,
            Err(err) => {
                warn!(error = %err, task_id = %id, "failed to update task");
                self.notifier.failure(MSG_UPDATE_FAILED);
                return Err(err.into());
            }
        };

        let merged = {
            let mut state = self.state.lock();
            state.tasks.iter_mut().find(|t| &t.id == id).map(|task| {
                row.apply_to(task);
                task.clone()
            })
        };

        let task = match merged {
            Some(task) => task,
            None => match row.into_task() {
                Ok(task) => task,
                Err(err) => {
                    self.notifier.failure(MSG_UPDATE_FAILED);
                    return Err(err.into());
                }
            },
        };

        info!(task_id = %id, "task updated");
        self.notifier.success(MSG_UPDATED);
        Ok(task)
    }

    /// Flip completion. Only the `completed` field of the local entry is
    /// touched. Returns the new value.
    pub async fn toggle_completion(&self, id: &TaskId, current: bool) -> Result<bool> {
        let requested = !current;
        match api::toggle_task_completion(self.store.as_ref(), id, requested).await {
            Ok(row) => {
                let completed = row.completed.unwrap_or(requested);
                {
                    let mut state = self.state.lock();
                    if let Some(task) = state.tasks.iter_mut().find(|t| &t.id == id) {
                        task.completed = completed;
                    }
                }
                info!(task_id = %id, completed, "task completion toggled");
                self.notifier.success(MSG_TOGGLED);
                Ok(completed)
            }
            Err(err) => {
                warn!(error = %err, task_id = %id, "failed to toggle task");
                self.notifier.failure(MSG_TOGGLE_FAILED);
                Err(err.into())
            }
        }
    }

    pub async fn remove(&self, id: &TaskId) -> Result<()> {
        match api::delete_task(self.store.as_ref(), id).await {
            Ok(()) => {
                self.state.lock().tasks.retain(|t| &t.id != id);
                info!(task_id = %id, "task deleted");
                self.notifier.success(MSG_DELETED);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, task_id = %id, "failed to delete task");
                self.notifier.failure(MSG_DELETE_FAILED);
                Err(err.into())
            }
        }
    }

    /// Delete several tasks concurrently.
    ///
    /// All requests are awaited before the local list changes; exactly the
    /// ids the store confirmed are then removed in one pass. The report says
    /// which ids failed. An empty id list is a no-op.
    pub async fn remove_many(&self, ids: &[TaskId]) -> Result<BulkDeleteReport> {
        let mut seen = HashSet::new();
        let ids: Vec<TaskId> = ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .cloned()
            .collect();
        if ids.is_empty() {
            return Ok(BulkDeleteReport::default());
        }

        let mut pending: JoinSet<(usize, std::result::Result<(), String>)> = JoinSet::new();
        for (index, id) in ids.iter().cloned().enumerate() {
            let store = Arc::clone(&self.store);
            pending.spawn(async move {
                let result = api::delete_task(store.as_ref(), &id)
                    .await
                    .map_err(|err| err.to_string());
                (index, result)
            });
        }

        let mut results: Vec<Option<std::result::Result<(), String>>> = vec![None; ids.len()];
        while let Some(joined) = pending.join_next().await {
            match joined {
                Ok((index, result)) => results[index] = Some(result),
                Err(err) => warn!(error = %err, "delete request aborted"),
            }
        }

        let outcomes: Vec<DeleteOutcome> = ids
            .into_iter()
            .zip(results)
            .map(|(id, result)| DeleteOutcome {
                id,
                error: match result {
                    Some(Ok(())) => None,
                    Some(Err(err)) => Some(err),
                    None => Some("delete request aborted".to_string()),
                },
            })
            .collect();
        let report = BulkDeleteReport { outcomes };

        let deleted: HashSet<&TaskId> = report.deleted().into_iter().collect();
        if !deleted.is_empty() {
            self.state.lock().tasks.retain(|t| !deleted.contains(&t.id));
        }

        let failed = report.failed().len();
        if failed == 0 {
            info!(count = report.outcomes.len(), "tasks deleted");
            self.notifier.success(MSG_BULK_DELETED);
        } else {
            warn!(failed, total = report.outcomes.len(), "bulk delete incomplete");
            self.notifier.failure(&format!(
                "Could not delete {failed} of {} tasks",
                report.outcomes.len()
            ));
        }
        Ok(report)
    }
}

fn dedupe_by_id(tasks: Vec<Task>) -> Vec<Task> {
    let mut seen = HashSet::new();
    tasks
        .into_iter()
        .filter(|task| {
            let fresh = seen.insert(task.id.clone());
            if !fresh {
                warn!(task_id = %task.id, "duplicate task id from store");
            }
            fresh
        })
        .collect()
}
