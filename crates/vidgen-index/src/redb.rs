//! redb-backed task index.
//!
//! Records are stored as serde_json bytes in a single table. redb is a
//! synchronous embedded store, so every transaction runs inside
//! `spawn_blocking`.

use ::redb::{Database, TableDefinition};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use vidgen_core::TaskRecord;

use crate::{IndexError, IndexResult, TaskIndex};

const TASKS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("tasks");

/// Embedded on-disk task index.
#[derive(Clone)]
pub struct RedbIndex {
    db: Arc<Database>,
}

impl RedbIndex {
    /// Open (or create) the index database at `path`. The table is created
    /// eagerly so reads never race table creation.
    pub fn open(path: impl AsRef<Path>) -> IndexResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| IndexError::Backend(format!("Failed to create index dir: {}", e)))?;
        }

        let db = Database::create(path.as_ref())
            .map_err(|e| IndexError::Backend(format!("Failed to open index database: {}", e)))?;

        let txn = db
            .begin_write()
            .map_err(|e| IndexError::Backend(e.to_string()))?;
        txn.open_table(TASKS_TABLE)
            .map_err(|e| IndexError::Backend(e.to_string()))?;
        txn.commit()
            .map_err(|e| IndexError::Backend(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    async fn run_blocking<T, F>(&self, op: F) -> IndexResult<T>
    where
        T: Send + 'static,
        F: FnOnce(Arc<Database>) -> IndexResult<T> + Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || op(db))
            .await
            .map_err(|e| IndexError::Backend(format!("Index task panicked: {}", e)))?
    }
}

#[async_trait]
impl TaskIndex for RedbIndex {
    async fn put(&self, task_id: &str, record: &TaskRecord) -> IndexResult<()> {
        let key = task_id.to_string();
        let value =
            serde_json::to_vec(record).map_err(|e| IndexError::Codec(e.to_string()))?;

        self.run_blocking(move |db| {
            let txn = db
                .begin_write()
                .map_err(|e| IndexError::Backend(e.to_string()))?;
            {
                let mut table = txn
                    .open_table(TASKS_TABLE)
                    .map_err(|e| IndexError::Backend(e.to_string()))?;
                table
                    .insert(key.as_str(), value.as_slice())
                    .map_err(|e| IndexError::Backend(e.to_string()))?;
            }
            txn.commit()
                .map_err(|e| IndexError::Backend(e.to_string()))?;
            Ok(())
        })
        .await
    }

    async fn get(&self, task_id: &str) -> IndexResult<Option<TaskRecord>> {
        let key = task_id.to_string();

        self.run_blocking(move |db| {
            let txn = db
                .begin_read()
                .map_err(|e| IndexError::Backend(e.to_string()))?;
            let table = txn
                .open_table(TASKS_TABLE)
                .map_err(|e| IndexError::Backend(e.to_string()))?;
            let guard = table
                .get(key.as_str())
                .map_err(|e| IndexError::Backend(e.to_string()))?;

            guard
                .map(|v| {
                    serde_json::from_slice(v.value())
                        .map_err(|e| IndexError::Codec(e.to_string()))
                })
                .transpose()
        })
        .await
    }

    async fn remove(&self, task_id: &str) -> IndexResult<Option<TaskRecord>> {
        let key = task_id.to_string();

        self.run_blocking(move |db| {
            let txn = db
                .begin_write()
                .map_err(|e| IndexError::Backend(e.to_string()))?;
            let removed = {
                let mut table = txn
                    .open_table(TASKS_TABLE)
                    .map_err(|e| IndexError::Backend(e.to_string()))?;
                let guard = table
                    .remove(key.as_str())
                    .map_err(|e| IndexError::Backend(e.to_string()))?;
                guard
                    .map(|v| {
                        serde_json::from_slice(v.value())
                            .map_err(|e| IndexError::Codec(e.to_string()))
                    })
                    .transpose()?
            };
            txn.commit()
                .map_err(|e| IndexError::Backend(e.to_string()))?;
            Ok(removed)
        })
        .await
    }
}
