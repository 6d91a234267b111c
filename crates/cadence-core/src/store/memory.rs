use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::table::TaskTable;
use super::TaskStore;
use crate::calendar::ViewWindow;
use crate::error::CoreError;
use crate::models::{NewTaskData, SeriesScope, Task, UpdateTaskData};
use crate::reorder::TaskOrderUpdate;

/// Volatile store, mostly useful for tests and previews.
#[derive(Debug, Default)]
pub struct MemoryTaskStore {
    table: RwLock<TaskTable>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self {
            table: RwLock::new(TaskTable::from_tasks(tasks)),
        }
    }
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
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
        self.table.write().await.insert(data)
    }

    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        self.table.write().await.update(id, data)
    }

    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError> {
        self.table.write().await.remove(id).map(|_| ())
    }

    async fn batch_reorder(&self, updates: &[TaskOrderUpdate]) -> Result<(), CoreError> {
        self.table.write().await.reorder(updates)
    }

    async fn update_series(
        &self,
        occurrence: &Task,
        data: UpdateTaskData,
        scope: SeriesScope,
    ) -> Result<Vec<Task>, CoreError> {
        self.table.write().await.update_series(occurrence, data, scope)
    }

    async fn delete_series(&self, occurrence: &Task, scope: SeriesScope) -> Result<usize, CoreError> {
        self.table.write().await.delete_series(occurrence, scope)
    }
}
