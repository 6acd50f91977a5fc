//! In-memory task index for tests and local development.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use vidgen_core::TaskRecord;

use crate::{IndexResult, TaskIndex};

#[derive(Default)]
pub struct MemoryIndex {
    records: RwLock<HashMap<String, TaskRecord>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records. Test helper.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl TaskIndex for MemoryIndex {
    async fn put(&self, task_id: &str, record: &TaskRecord) -> IndexResult<()> {
        self.records
            .write()
            .await
            .insert(task_id.to_string(), record.clone());
        Ok(())
    }

    async fn get(&self, task_id: &str) -> IndexResult<Option<TaskRecord>> {
        Ok(self.records.read().await.get(task_id).cloned())
    }

    async fn remove(&self, task_id: &str) -> IndexResult<Option<TaskRecord>> {
        Ok(self.records.write().await.remove(task_id))
    }
}
