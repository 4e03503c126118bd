//! Remote store client handle.
//!
//! The hosted table store owns durable state. `RemoteStore` is the seam the
//! data-access layer talks to; the entry point builds one handle (normally a
//! [`PostgrestStore`]) and passes it down explicitly.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::task::TaskId;

pub mod http;
pub mod rows;

pub use http::PostgrestStore;
pub use rows::{CategoryRow, NewTaskRow, TaskPatchRow, TaskRow};

pub type StoreResult<T> = std::result::Result<T, RemoteError>;

/// Row-level operations on the `tareas` and `categorias` tables.
///
/// Each method issues exactly one request and returns the store's error
/// unchanged on failure.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Full scan ordered by creation time, newest first.
    async fn select_tasks(&self) -> StoreResult<Vec<TaskRow>>;

    /// Insert one row and return the stored representation.
    async fn insert_task(&self, row: NewTaskRow) -> StoreResult<TaskRow>;

    /// Update the row matching `id` and return the stored representation.
    async fn update_task(&self, id: &TaskId, patch: TaskPatchRow) -> StoreResult<TaskRow>;

    async fn delete_task(&self, id: &TaskId) -> StoreResult<()>;

    /// Full scan ordered by name, ascending.
    async fn select_categories(&self) -> StoreResult<Vec<CategoryRow>>;
}
