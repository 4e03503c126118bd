#![allow(dead_code)]

use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::oneshot;

use taskboard::error::RemoteError;
use taskboard::notify::RecordingNotifier;
use taskboard::store::{
    CategoryRow, NewTaskRow, RemoteStore, StoreResult, TaskPatchRow, TaskRow,
};
use taskboard::sync::TaskSync;
use taskboard::task::TaskId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
    Categories,
}

#[derive(Default)]
struct FakeState {
    rows: Vec<Value>,
    categories: Vec<Value>,
    next_id: i64,
    failing: HashSet<Op>,
    failing_deletes: HashSet<String>,
    held_selects: VecDeque<oneshot::Receiver<()>>,
    patches: Vec<Value>,
    calls: Vec<Op>,
}

/// In-memory stand-in for the hosted store. Rows are kept as raw JSON so
/// every response goes through the real row mapping.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<FakeState>,
}

impl FakeStore {
    pub fn with_rows(rows: Vec<Value>) -> Arc<Self> {
        let store = Self::default();
        {
            let mut state = store.state.lock();
            state.next_id = 100;
            state.rows = rows;
        }
        Arc::new(store)
    }

    pub fn set_rows(&self, rows: Vec<Value>) {
        self.state.lock().rows = rows;
    }

    pub fn set_categories(&self, rows: Vec<Value>) {
        self.state.lock().categories = rows;
    }

    /// Every future call of `op` fails until `recover` is called.
    pub fn fail(&self, op: Op) {
        self.state.lock().failing.insert(op);
    }

    pub fn recover(&self, op: Op) {
        self.state.lock().failing.remove(&op);
    }

    pub fn fail_delete_of(&self, id: &str) {
        self.state.lock().failing_deletes.insert(id.to_string());
    }

    /// The next `select_tasks` snapshots the rows, then waits for the
    /// returned sender before answering.
    pub fn hold_next_select(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state.lock().held_selects.push_back(rx);
        tx
    }

    pub fn patches(&self) -> Vec<Value> {
        self.state.lock().patches.clone()
    }

    pub fn calls(&self) -> Vec<Op> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, op: Op) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == op).count()
    }

    pub fn row_ids(&self) -> Vec<String> {
        self.state.lock().rows.iter().map(row_id).collect()
    }

    fn begin(&self, op: Op) -> StoreResult<()> {
        let mut state = self.state.lock();
        state.calls.push(op);
        if state.failing.contains(&op) {
            return Err(RemoteError::new(format!("{op:?} rejected")).with_status(500));
        }
        Ok(())
    }
}

fn row_id(row: &Value) -> String {
    match &row["id_tarea"] {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> StoreResult<T> {
    serde_json::from_value(value).map_err(|err| RemoteError::new(err.to_string()))
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn select_tasks(&self) -> StoreResult<Vec<TaskRow>> {
        self.begin(Op::Select)?;
        let (rows, gate) = {
            let mut state = self.state.lock();
            (state.rows.clone(), state.held_selects.pop_front())
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        rows.into_iter().map(decode).collect()
    }

    async fn insert_task(&self, row: NewTaskRow) -> StoreResult<TaskRow> {
        self.begin(Op::Insert)?;
        let mut value = serde_json::to_value(&row).map_err(|e| RemoteError::new(e.to_string()))?;
        let stored = {
            let mut state = self.state.lock();
            state.next_id += 1;
            value["id_tarea"] = json!(state.next_id);
            value["fecha_creacion"] = json!("2025-01-10T12:00:00Z");
            state.rows.insert(0, value.clone());
            value
        };
        decode(stored)
    }

    async fn update_task(&self, id: &TaskId, patch: TaskPatchRow) -> StoreResult<TaskRow> {
        self.begin(Op::Update)?;
        let patch = serde_json::to_value(&patch).map_err(|e| RemoteError::new(e.to_string()))?;
        let updated = {
            let mut state = self.state.lock();
            state.patches.push(patch.clone());
            let row = state
                .rows
                .iter_mut()
                .find(|row| row_id(row) == id.as_str())
                .ok_or_else(|| RemoteError::new("no row matched the update"))?;
            if let (Some(target), Some(fields)) = (row.as_object_mut(), patch.as_object()) {
                for (key, value) in fields {
                    target.insert(key.clone(), value.clone());
                }
            }
            row.clone()
        };
        decode(updated)
    }

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()> {
        self.begin(Op::Delete)?;
        let mut state = self.state.lock();
        if state.failing_deletes.contains(id.as_str()) {
            return Err(RemoteError::new(format!("cannot delete {id}")).with_status(409));
        }
        state.rows.retain(|row| row_id(row) != id.as_str());
        Ok(())
    }

    async fn select_categories(&self) -> StoreResult<Vec<CategoryRow>> {
        self.begin(Op::Categories)?;
        let rows = self.state.lock().categories.clone();
        rows.into_iter().map(decode).collect()
    }
}

/// A full task row as the store returns it.
pub fn task_row(id: i64, title: &str) -> Value {
    json!({
        "id_tarea": id,
        "titulo": title,
        "descripcion": null,
        "fecha_limite": null,
        "completada": false,
        "categoria": "personal",
        "prioridad": "media",
        "fecha_creacion": "2025-01-01T09:00:00Z",
        "fecha_actualizacion": null
    })
}

pub struct Harness {
    pub store: Arc<FakeStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub sync: TaskSync,
}

impl Harness {
    pub fn new(rows: Vec<Value>) -> Self {
        let store = FakeStore::with_rows(rows);
        let notifier = Arc::new(RecordingNotifier::new());
        let sync = TaskSync::new(store.clone(), notifier.clone());
        Self {
            store,
            notifier,
            sync,
        }
    }

    pub fn ids(&self) -> Vec<String> {
        self.sync.tasks().iter().map(|t| t.id.to_string()).collect()
    }
}

pub struct TestConfig {
    dir: TempDir,
}

impl TestConfig {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create tempdir"),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().join("taskboard.toml")
    }

    pub fn write(&self, contents: &str) -> PathBuf {
        let path = self.path();
        std::fs::write(&path, contents).expect("write config");
        path
    }
}
