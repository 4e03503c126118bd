//! Store records and their translation to the canonical model.
//!
//! Column names of the `tareas` and `categorias` tables appear only in this
//! file. Every mapping here is total: a missing or malformed column turns
//! into a default, never into an error, except for the row id.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::category::CategoryEntry;
use crate::error::RemoteError;
use crate::task::{Category, Priority, Task, TaskId, TaskInput, TaskPatch, DUE_DATE_FORMAT};

pub const TASK_ID_COLUMN: &str = "id_tarea";
pub const TASK_ORDER_COLUMN: &str = "fecha_creacion";
pub const CATEGORY_ORDER_COLUMN: &str = "nombre";

/// Row ids arrive as JSON numbers or strings depending on the column type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Int(i64),
    Text(String),
}

impl From<RawId> for TaskId {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Int(value) => TaskId::from(value),
            RawId::Text(value) => TaskId::from(value),
        }
    }
}

impl RawId {
    fn into_string(self) -> String {
        match self {
            RawId::Int(value) => value.to_string(),
            RawId::Text(value) => value,
        }
    }
}

/// A raw `tareas` record as returned by the store.
///
/// Nullable columns use `Option<Option<_>>`: the outer level records whether
/// the store returned the column at all, the inner one whether it was null.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskRow {
    #[serde(rename = "id_tarea", default)]
    pub id: Option<RawId>,
    #[serde(rename = "titulo", default)]
    pub title: Option<String>,
    #[serde(rename = "descripcion", default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(rename = "fecha_limite", default, deserialize_with = "nullable")]
    pub due_date: Option<Option<String>>,
    #[serde(rename = "completada", default)]
    pub completed: Option<bool>,
    #[serde(rename = "categoria", default)]
    pub category: Option<String>,
    #[serde(rename = "prioridad", default)]
    pub priority: Option<String>,
    #[serde(rename = "fecha_creacion", default)]
    pub created_at: Option<String>,
    #[serde(rename = "fecha_actualizacion", default)]
    pub updated_at: Option<String>,
}

fn nullable<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl TaskRow {
    /// Normalize into a full `Task`. Fails only when the row has no id.
    pub fn into_task(self) -> std::result::Result<Task, RemoteError> {
        let id: TaskId = self
            .id
            .ok_or_else(|| RemoteError::new(format!("store record is missing {TASK_ID_COLUMN}")))?
            .into();

        let title = self.title.unwrap_or_else(|| {
            warn!(task_id = %id, "store record has no title");
            String::new()
        });

        Ok(Task {
            description: self.description.flatten().and_then(normalize_text),
            due_date: self
                .due_date
                .flatten()
                .and_then(|raw| parse_store_date(&id, &raw)),
            completed: self.completed.unwrap_or(false),
            category: self
                .category
                .as_deref()
                .map(Category::new)
                .unwrap_or_default(),
            priority: parse_store_priority(&id, self.priority.as_deref()),
            deleted: false,
            title,
            id,
        })
    }

    /// Merge the columns the store returned into an existing local task.
    /// Columns absent from the row leave the local value untouched.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone().and_then(normalize_text);
        }
        if let Some(due_date) = &self.due_date {
            task.due_date = due_date
                .as_deref()
                .and_then(|raw| parse_store_date(&task.id, raw));
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(category) = self.category.as_deref().filter(|c| !c.trim().is_empty()) {
            task.category = Category::new(category);
        }
        if let Some(priority) = self.priority.as_deref().filter(|p| !p.trim().is_empty()) {
            task.priority = parse_store_priority(&task.id, Some(priority));
        }
    }
}

fn normalize_text(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Accepts `YYYY-MM-DD` or any longer timestamp starting with one.
fn parse_store_date(id: &TaskId, raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    match NaiveDate::parse_from_str(date_part, DUE_DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            warn!(task_id = %id, raw, "ignoring unparseable due date");
            None
        }
    }
}

fn parse_store_priority(id: &TaskId, raw: Option<&str>) -> Priority {
    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        None => Priority::default(),
        Some(value) => value.parse().unwrap_or_else(|_| {
            warn!(task_id = %id, raw = value, "unknown priority; using default");
            Priority::default()
        }),
    }
}

fn format_date(date: NaiveDate) -> String {
    date.format(DUE_DATE_FORMAT).to_string()
}

/// Insert payload for `tareas`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewTaskRow {
    #[serde(rename = "titulo")]
    pub title: String,
    #[serde(rename = "descripcion")]
    pub description: Option<String>,
    #[serde(rename = "fecha_limite")]
    pub due_date: Option<String>,
    #[serde(rename = "completada")]
    pub completed: bool,
    #[serde(rename = "categoria")]
    pub category: String,
    #[serde(rename = "prioridad")]
    pub priority: String,
}

impl From<&TaskInput> for NewTaskRow {
    fn from(input: &TaskInput) -> Self {
        Self {
            title: input.title.trim().to_string(),
            description: input.description.clone().and_then(normalize_text),
            due_date: input.due_date.map(format_date),
            completed: input.completed,
            category: input.category.to_string(),
            priority: input.priority.to_string(),
        }
    }
}

/// Update payload for `tareas`. Only patched columns are serialized, plus the
/// last-modified stamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPatchRow {
    #[serde(rename = "titulo", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "descripcion", skip_serializing_if = "Option::is_none")]
    pub description: Option<Option<String>>,
    #[serde(rename = "fecha_limite", skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<String>>,
    #[serde(rename = "completada", skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
    #[serde(rename = "categoria", skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(rename = "prioridad", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(rename = "fecha_actualizacion")]
    pub updated_at: String,
}

impl TaskPatchRow {
    pub fn new(patch: &TaskPatch, updated_at: DateTime<Utc>) -> Self {
        Self {
            title: patch.title.as_ref().map(|title| title.trim().to_string()),
            description: patch
                .description
                .clone()
                .map(|description| description.and_then(normalize_text)),
            due_date: patch.due_date.map(|due| due.map(format_date)),
            completed: patch.completed,
            category: patch.category.as_ref().map(|category| category.to_string()),
            priority: patch.priority.map(|priority| priority.to_string()),
            updated_at: updated_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// A raw `categorias` record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryRow {
    #[serde(rename = "id_categoria", default)]
    pub id: Option<RawId>,
    #[serde(rename = "nombre", default)]
    pub name: Option<String>,
}

impl CategoryRow {
    /// Rows without a usable name are dropped.
    pub fn into_entry(self) -> Option<CategoryEntry> {
        let name = self.name.and_then(normalize_text)?;
        Some(CategoryEntry {
            id: self.id.map(RawId::into_string).unwrap_or_default(),
            name: name.trim().to_string(),
        })
    }
}
