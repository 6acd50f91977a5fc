//! Task index abstraction
//!
//! The index maps a provider task id to its [`TaskRecord`] and supports
//! exactly three operations: `put`, `get`, and an atomic `remove` that
//! returns what it removed. Removal returning the record makes duplicate
//! concurrent finalizes observable without any locking; the workflow treats
//! record cleanup as at-least-once.

mod memory;
mod redb;

pub use memory::MemoryIndex;
pub use self::redb::RedbIndex;

use async_trait::async_trait;
use thiserror::Error;
use vidgen_core::TaskRecord;

/// Task index operation errors
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Index backend error: {0}")]
    Backend(String),

    #[error("Task record codec error: {0}")]
    Codec(String),
}

/// Result type for index operations
pub type IndexResult<T> = Result<T, IndexError>;

/// Key-value index of outstanding provider tasks.
#[async_trait]
pub trait TaskIndex: Send + Sync {
    /// Write the record for a task id, replacing any previous record.
    async fn put(&self, task_id: &str, record: &TaskRecord) -> IndexResult<()>;

    /// Read the record for a task id, if present.
    async fn get(&self, task_id: &str) -> IndexResult<Option<TaskRecord>>;

    /// Remove and return the record for a task id. At most one caller
    /// observes `Some` for a given stored record.
    async fn remove(&self, task_id: &str) -> IndexResult<Option<TaskRecord>>;
}
