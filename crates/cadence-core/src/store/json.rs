use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::table::TaskTable;
use super::TaskStore;
use crate::calendar::ViewWindow;
use crate::error::CoreError;
use crate::models::{NewTaskData, SeriesScope, Task, UpdateTaskData};
use crate::reorder::TaskOrderUpdate;

/// Store backed by a JSON array of tasks on disk.
///
/// The whole file is rewritten after each change, through a sibling temp file
/// and a rename. A change that fails to save is not kept in memory either.
#[derive(Debug)]
pub struct JsonFileTaskStore {
    path: PathBuf,
    table: RwLock<TaskTable>,
}

impl JsonFileTaskStore {
    /// Opens the store at `path`. A missing file is an empty store; it is
    /// created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let tasks = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => Vec::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), tasks = tasks.len(), "task store opened");
        Ok(Self {
            path,
            table: RwLock::new(TaskTable::from_tasks(tasks)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `change` to a copy of the table, persists the copy and only
    /// then swaps it in.
    async fn commit<T>(
        &self,
        change: impl FnOnce(&mut TaskTable) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let mut table = self.table.write().await;
        let mut draft = table.clone();
        let result = change(&mut draft)?;
        save(&self.path, draft.tasks()).await?;
        *table = draft;
        Ok(result)
    }
}

async fn save(path: &Path, tasks: &[Task]) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let bytes = serde_json::to_vec_pretty(tasks)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    tracing::trace!(path = %path.display(), tasks = tasks.len(), "task store saved");
    Ok(())
}

#[async_trait]
impl TaskStore for JsonFileTaskStore {
    async fn list_tasks_in_range(&self, window: &ViewWindow) -> Result<Vec<Task>, CoreError> {
        Ok(self.table.read().await.in_range(window))
    }

    async fn list_tasks(&self) -> Result<Vec<Task>, CoreError> {
        Ok(self.table.read().await.sorted())
    }

    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, CoreError> {
        Ok(self.table.read().await.find(id).cloned())
    }

    async fn create_task(&self, data: NewTaskData) -> Result<Task, CoreError> {
        self.commit(|table| table.insert(data)).await
    }

    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        self.commit(|table| table.update(id, data)).await
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError> {
        let removed = self.commit(|table| table.remove(id)).await?;
        tracing::debug!(task_id = %id, removed, "task deleted");
        Ok(())
    }

    async fn batch_reorder(&self, updates: &[TaskOrderUpdate]) -> Result<(), CoreError> {
        if updates.is_empty() {
            return Ok(());
        }
        self.commit(|table| table.reorder(updates)).await
    }

    async fn update_series(
        &self,
        occurrence: &Task,
        data: UpdateTaskData,
        scope: SeriesScope,
    ) -> Result<Vec<Task>, CoreError> {
        self.commit(|table| table.update_series(occurrence, data, scope)).await
    }

    async fn delete_series(&self, occurrence: &Task, scope: SeriesScope) -> Result<usize, CoreError> {
        let removed = self.commit(|table| table.delete_series(occurrence, scope)).await?;
        tracing::debug!(task_id = %occurrence.id, %scope, removed, "series deleted");
        Ok(removed)
    }
}
