//! Drag-and-drop reorder planning.
//!
//! A move produces a batch of `(id, order, date)` updates that the caller
//! persists in one round trip. The planner only ever touches the dragged task
//! and the tasks of the destination day.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::serde_date;
use crate::models::Task;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskOrderUpdate {
    pub id: Uuid,
    pub order: i64,
    #[serde(with = "serde_date")]
    pub date: NaiveDate,
}

/// Body of the batch reorder request: `{ "tasks": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReorderBatch {
    pub tasks: Vec<TaskOrderUpdate>,
}

impl From<Vec<TaskOrderUpdate>> for ReorderBatch {
    fn from(tasks: Vec<TaskOrderUpdate>) -> Self {
        Self { tasks }
    }
}

/// One drop event.
#[derive(Debug, Clone)]
pub struct MoveRequest<'a> {
    pub task: &'a Task,
    pub source_date: NaiveDate,
    /// Position of the task in its day list when the drag started
    pub source_index: usize,
    pub destination_date: NaiveDate,
    /// Destination day list in display order, without the dragged task
    pub destination_tasks: Vec<&'a Task>,
    /// Insertion point in `destination_tasks`; `None` appends
    pub target_index: Option<usize>,
}

impl<'a> MoveRequest<'a> {
    /// Builds a request from the day lists as displayed (sorted by `order`).
    ///
    /// `source_day` and `destination_day` may both still contain the dragged
    /// task; it is located in the former and removed from the latter.
    pub fn between_days(
        task: &'a Task,
        source_day: &[&'a Task],
        destination_date: NaiveDate,
        destination_day: &[&'a Task],
        target_index: Option<usize>,
    ) -> Self {
        let source_index = source_day
            .iter()
            .position(|candidate| candidate.id == task.id)
            .unwrap_or(source_day.len());
        let destination_tasks = destination_day
            .iter()
            .copied()
            .filter(|candidate| candidate.id != task.id)
            .collect();

        Self {
            task,
            source_date: task.date,
            source_index,
            destination_date,
            destination_tasks,
            target_index,
        }
    }

    #[inline]
    pub fn is_same_day(&self) -> bool {
        self.source_date == self.destination_date
    }
}

/// Computes the updates for a drop.
///
/// - Same day: the task is spliced in at the clamped target index and every
///   task of the day gets `order = position`. When the resulting sequence is
///   the sequence the day started with, nothing is emitted.
/// - Other day: the task is spliced into the destination list at the target
///   and takes `order = target`. Every destination task whose stored order
///   differs from its new position gets `order = position`, so gaps left by
///   deletes or earlier moves are closed.
///
/// Out-of-range target indices are clamped.
pub fn plan_move(request: &MoveRequest<'_>) -> Vec<TaskOrderUpdate> {
    let others = &request.destination_tasks;
    let target = request.target_index.unwrap_or(others.len()).min(others.len());
    let destination = request.destination_date;

    if request.is_same_day() {
        let mut reordered = others.clone();
        reordered.insert(target, request.task);

        let mut original = others.clone();
        original.insert(request.source_index.min(others.len()), request.task);

        if reordered.iter().map(|t| t.id).eq(original.iter().map(|t| t.id)) {
            tracing::debug!(task_id = %request.task.id, "drop left the day unchanged");
            return Vec::new();
        }

        return reordered
            .iter()
            .enumerate()
            .map(|(position, task)| TaskOrderUpdate {
                id: task.id,
                order: position_order(position),
                date: destination,
            })
            .collect();
    }

    let mut arranged = others.clone();
    arranged.insert(target, request.task);

    arranged
        .iter()
        .enumerate()
        .filter(|(position, task)| {
            task.id == request.task.id || task.order != position_order(*position)
        })
        .map(|(position, task)| TaskOrderUpdate {
            id: task.id,
            order: position_order(position),
            date: destination,
        })
        .collect()
}

#[inline]
fn position_order(position: usize) -> i64 {
    i64::try_from(position).unwrap_or(i64::MAX)
}
