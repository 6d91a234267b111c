//! Task persistence.
//!
//! The expansion and reorder code never touches storage; everything that
//! reads or writes tasks goes through [`TaskStore`].

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use crate::calendar::ViewWindow;
use crate::error::CoreError;
use crate::models::{NewTaskData, SeriesScope, Task, UpdateTaskData};
use crate::recurrence::RecurrenceExpander;
use crate::reorder::TaskOrderUpdate;

mod json;
mod memory;
mod table;

pub use json::JsonFileTaskStore;
pub use memory::MemoryTaskStore;

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Tasks dated inside `window`, plus every recurring parent anchored on
    /// or before `window.end`.
    async fn list_tasks_in_range(&self, window: &ViewWindow) -> Result<Vec<Task>, CoreError>;
    async fn list_tasks(&self) -> Result<Vec<Task>, CoreError>;
    async fn find_task(&self, id: Uuid) -> Result<Option<Task>, CoreError>;
    async fn create_task(&self, data: NewTaskData) -> Result<Task, CoreError>;
    async fn update_task(&self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError>;
    /// Deleting a series parent also deletes its stored instances.
    async fn delete_task(&self, id: Uuid) -> Result<(), CoreError>;
    /// Applies every update or none.
    async fn batch_reorder(&self, updates: &[TaskOrderUpdate]) -> Result<(), CoreError>;
    /// Applies `data` to `scope` of the series `occurrence` belongs to.
    /// `occurrence` may be the parent, a stored instance or a virtual one.
    /// Returns the touched tasks, series parents first.
    async fn update_series(
        &self,
        occurrence: &Task,
        data: UpdateTaskData,
        scope: SeriesScope,
    ) -> Result<Vec<Task>, CoreError>;
    /// Removes `scope` of the series `occurrence` belongs to and returns the
    /// number of stored tasks deleted.
    async fn delete_series(&self, occurrence: &Task, scope: SeriesScope) -> Result<usize, CoreError>;

    async fn find_tasks_by_id_prefix(&self, prefix: &str) -> Result<Vec<Task>, CoreError> {
        let prefix = prefix.to_lowercase();
        Ok(self
            .list_tasks()
            .await?
            .into_iter()
            .filter(|task| task.id.to_string().starts_with(&prefix))
            .collect())
    }
}

/// Turns a virtual occurrence of `parent` on `date` into a stored task.
///
/// The new task copies the parent's content and order, and links back through
/// `parent_task_id`. Fails with [`CoreError::InvalidInput`] when the parent has
/// no active rule, when `date` is not one of its occurrences, or when the
/// date is already covered by the parent or a stored instance.
pub async fn materialize_occurrence<S>(
    store: &S,
    parent: &Task,
    date: NaiveDate,
    completed: bool,
) -> Result<Task, CoreError>
where
    S: TaskStore + ?Sized,
{
    let expander = RecurrenceExpander::for_task(parent).ok_or_else(|| {
        CoreError::InvalidInput(format!("Task '{}' is not a recurring series", parent.title))
    })?;

    if date == parent.date {
        return Err(CoreError::InvalidInput(format!(
            "{} is the series anchor and is already stored",
            date
        )));
    }

    let is_occurrence = expander
        .occurrences()
        .take_while(|candidate| *candidate <= date)
        .any(|candidate| candidate == date);
    if !is_occurrence {
        return Err(CoreError::InvalidInput(format!(
            "{} is not an occurrence of '{}'",
            date, parent.title
        )));
    }

    let covered = store
        .list_tasks_in_range(&ViewWindow::single_day(date))
        .await?
        .iter()
        .any(|task| task.parent_task_id == Some(parent.id) && task.date == date);
    if covered {
        return Err(CoreError::InvalidInput(format!(
            "{} already has a stored instance of '{}'",
            date, parent.title
        )));
    }

    store
        .create_task(NewTaskData {
            title: parent.title.clone(),
            description: parent.description.clone(),
            date: Some(date),
            priority: Some(parent.priority),
            order: Some(parent.order),
            completed,
            recurrence: None,
            parent_task_id: Some(parent.id),
        })
        .await
}
