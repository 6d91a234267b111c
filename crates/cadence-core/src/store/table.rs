use std::num::NonZeroU32;

use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::calendar::ViewWindow;
use crate::error::CoreError;
use crate::models::{
    NewTaskData, RecurrenceEnd, RecurrenceRule, SeriesScope, Task, UpdateTaskData,
};
use crate::recurrence::RecurrenceExpander;
use crate::reorder::TaskOrderUpdate;

/// In-memory task list shared by the store implementations.
///
/// Every mutating method validates before it touches `tasks`, so a returned
/// error leaves the table unchanged.
#[derive(Debug, Clone, Default)]
pub(crate) struct TaskTable {
    tasks: Vec<Task>,
}

impl TaskTable {
    pub(crate) fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub(crate) fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub(crate) fn sorted(&self) -> Vec<Task> {
        let mut tasks = self.tasks.clone();
        sort_for_display(&mut tasks);
        tasks
    }

    pub(crate) fn in_range(&self, window: &ViewWindow) -> Vec<Task> {
        let mut tasks: Vec<Task> = self
            .tasks
            .iter()
            .filter(|task| {
                window.contains(task.date)
                    || (task.active_recurrence().is_some() && task.date <= window.end)
            })
            .cloned()
            .collect();
        sort_for_display(&mut tasks);
        tasks
    }

    pub(crate) fn find(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    pub(crate) fn insert(&mut self, data: NewTaskData) -> Result<Task, CoreError> {
        let title = data.title.trim();
        if title.is_empty() {
            return Err(CoreError::InvalidInput("Task title cannot be empty".to_string()));
        }

        if let Some(parent_id) = data.parent_task_id {
            if self.find(parent_id).is_none() {
                return Err(CoreError::NotFound(parent_id.to_string()));
            }
        }

        let recurrence = match (data.parent_task_id, data.recurrence) {
            (Some(parent_id), Some(_)) => {
                tracing::warn!(%parent_id, "instances cannot carry a recurrence rule, dropping it");
                None
            }
            (_, rule) => rule.filter(RecurrenceRule::is_active),
        };

        let date = data.date.unwrap_or_else(|| chrono::Local::now().date_naive());
        let order = data.order.unwrap_or_else(|| self.next_order(date));
        let now = Utc::now();

        let task = Task {
            id: Uuid::new_v4(),
            title: title.to_string(),
            description: data.description.filter(|d| !d.trim().is_empty()),
            date,
            order,
            priority: data.priority.unwrap_or_default(),
            completed: data.completed,
            created_at: now,
            updated_at: now,
            is_recurring: data.parent_task_id.is_some() || recurrence.is_some(),
            recurrence,
            parent_task_id: data.parent_task_id,
        };

        tracing::debug!(task_id = %task.id, date = %task.date, order = task.order, "task created");
        self.tasks.push(task.clone());
        Ok(task)
    }

    pub(crate) fn update(&mut self, id: Uuid, data: UpdateTaskData) -> Result<Task, CoreError> {
        check_title(&data)?;

        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| CoreError::NotFound(id.to_string()))?;

        if let Some(title) = data.title {
            task.title = title.trim().to_string();
        }
        if let Some(description) = data.description {
            task.description = description;
        }
        if let Some(date) = data.date {
            task.date = date;
        }
        if let Some(order) = data.order {
            task.order = order;
        }
        if let Some(priority) = data.priority {
            task.priority = priority;
        }
        if let Some(completed) = data.completed {
            task.completed = completed;
        }
        if let Some(recurrence) = data.recurrence {
            if task.parent_task_id.is_some() {
                if recurrence.is_some() {
                    tracing::warn!(task_id = %id, "instances cannot carry a recurrence rule, ignoring it");
                }
            } else {
                task.recurrence = recurrence.filter(RecurrenceRule::is_active);
                task.is_recurring = task.recurrence.is_some();
            }
        }
        task.updated_at = Utc::now();

        Ok(task.clone())
    }

    /// Removes the task and, when it anchors a series, all of its instances.
    /// Returns the number of removed tasks.
    pub(crate) fn remove(&mut self, id: Uuid) -> Result<usize, CoreError> {
        if self.find(id).is_none() {
            return Err(CoreError::NotFound(id.to_string()));
        }

        let before = self.tasks.len();
        self.tasks
            .retain(|task| task.id != id && task.parent_task_id != Some(id));
        Ok(before - self.tasks.len())
    }

    pub(crate) fn reorder(&mut self, updates: &[TaskOrderUpdate]) -> Result<(), CoreError> {
        if let Some(missing) = updates.iter().find(|update| self.find(update.id).is_none()) {
            return Err(CoreError::NotFound(missing.id.to_string()));
        }

        let now = Utc::now();
        for update in updates {
            if let Some(task) = self.tasks.iter_mut().find(|task| task.id == update.id) {
                task.order = update.order;
                task.date = update.date;
                task.updated_at = now;
            }
        }
        Ok(())
    }

    fn next_order(&self, date: NaiveDate) -> i64 {
        self.tasks
            .iter()
            .filter(|task| task.date == date)
            .map(|task| task.order)
            .max()
            .map_or(0, |max| max + 1)
    }
}

// ============================================================================
// Series-scoped edits
// ============================================================================

/// The occurrence a series edit starts from.
struct SeriesPoint {
    parent: Task,
    date: NaiveDate,
    /// Set when the occurrence is a stored instance rather than a virtual one
    stored: Option<Uuid>,
}

impl SeriesPoint {
    fn is_anchor(&self) -> bool {
        self.date == self.parent.date
    }
}

impl TaskTable {
    /// Removes `scope` of the series `picked` belongs to. `picked` may be the
    /// parent, a stored instance or a virtual instance.
    ///
    /// - `This` cuts one occurrence out: the rule ends the day before and a
    ///   new series picks up at the next occurrence. On the anchor the series
    ///   start moves to the next occurrence instead.
    /// - `Future` ends the rule the day before and drops later instances.
    ///   From the anchor it is the same as `All`.
    /// - `All` deletes the parent and its instances.
    ///
    /// Returns the number of stored tasks removed.
    pub(crate) fn delete_series(&mut self, picked: &Task, scope: SeriesScope) -> Result<usize, CoreError> {
        let point = self.series_point(picked)?;
        let parent_id = point.parent.id;

        match scope {
            SeriesScope::This => {
                let on_rule = is_occurrence(&point.parent, point.date);
                if let Some(id) = point.stored.filter(|_| !on_rule) {
                    // A moved instance no longer stands for a rule date
                    return self.remove(id);
                }
                if !on_rule {
                    return Err(not_an_occurrence(&point));
                }

                let removed = match point.stored {
                    Some(id) => self.remove(id)?,
                    None => 0,
                };
                if point.is_anchor() {
                    return match next_occurrence(&point.parent, point.date) {
                        Some(next) => {
                            self.restart_series(&point.parent, next);
                            Ok(removed)
                        }
                        None => Ok(removed + self.remove(parent_id)?),
                    };
                }

                self.cut_out(&point.parent, point.date)?;
                tracing::debug!(%parent_id, date = %point.date, "occurrence removed from series");
                Ok(removed)
            }
            SeriesScope::Future if point.date > point.parent.date => {
                self.check_pickable(&point)?;
                let cut = point.date;
                if let Some(rule) = self.rule_mut(parent_id) {
                    end_rule_before(rule, point.parent.date, cut);
                }

                let before = self.tasks.len();
                self.tasks
                    .retain(|task| task.parent_task_id != Some(parent_id) || task.date < cut);
                tracing::debug!(%parent_id, %cut, "series ended");
                Ok(before - self.tasks.len())
            }
            SeriesScope::Future | SeriesScope::All => self.remove(parent_id),
        }
    }

    /// Applies `data` to `scope` of the series `picked` belongs to.
    ///
    /// - `This` updates a stored instance, or stores a virtual one first. On
    ///   the anchor the parent moves to the next occurrence and the anchor
    ///   date stays behind as an edited instance.
    /// - `Future` ends the current series the day before and starts a new
    ///   series on the picked date with the changes applied. Later stored
    ///   instances move to the new series. From the anchor it is the same
    ///   as `All`.
    /// - `All` updates the parent; title, description and priority also
    ///   reach the stored instances.
    ///
    /// Returns the touched tasks, series parents first.
    pub(crate) fn update_series(
        &mut self,
        picked: &Task,
        data: UpdateTaskData,
        scope: SeriesScope,
    ) -> Result<Vec<Task>, CoreError> {
        check_title(&data)?;
        let point = self.series_point(picked)?;
        let parent = &point.parent;

        match scope {
            SeriesScope::This => {
                if let Some(id) = point.stored {
                    return Ok(vec![self.update(id, data)?]);
                }
                if !is_occurrence(parent, point.date) {
                    return Err(not_an_occurrence(&point));
                }

                let next = next_occurrence(parent, point.date);
                if point.is_anchor() && next.is_none() {
                    // A single-occurrence series is just its parent
                    return Ok(vec![self.update(parent.id, data)?]);
                }

                let instance = self.insert(NewTaskData {
                    title: parent.title.clone(),
                    description: parent.description.clone(),
                    date: Some(point.date),
                    priority: Some(parent.priority),
                    order: Some(parent.order),
                    completed: point.is_anchor() && parent.completed,
                    recurrence: None,
                    parent_task_id: Some(parent.id),
                })?;
                if let (true, Some(next)) = (point.is_anchor(), next) {
                    self.restart_series(parent, next);
                }
                Ok(vec![self.update(instance.id, data)?])
            }
            SeriesScope::Future if point.date > parent.date => {
                self.check_pickable(&point)?;
                self.split_series(&point, data)
            }
            SeriesScope::Future | SeriesScope::All => {
                let parent_id = parent.id;
                let patch = content_patch(&data);
                let mut touched = vec![self.update(parent_id, data)?];

                let instance_ids: Vec<Uuid> = self
                    .tasks
                    .iter()
                    .filter(|task| task.parent_task_id == Some(parent_id))
                    .map(|task| task.id)
                    .collect();
                for id in instance_ids {
                    touched.push(self.update(id, patch.clone())?);
                }
                Ok(touched)
            }
        }
    }

    fn split_series(&mut self, point: &SeriesPoint, data: UpdateTaskData) -> Result<Vec<Task>, CoreError> {
        let old = &point.parent;
        let cut = point.date;
        let rule = match &data.recurrence {
            Some(rule) => rule.clone(),
            None => old.recurrence.as_ref().and_then(|rule| continue_rule(rule, old.date, cut)),
        };
        let on_cut = self
            .tasks
            .iter()
            .find(|task| task.parent_task_id == Some(old.id) && task.date == cut)
            .map(|task| (task.id, task.completed));

        let successor = self.insert(NewTaskData {
            title: data.title.clone().unwrap_or_else(|| old.title.clone()),
            description: data.description.clone().unwrap_or_else(|| old.description.clone()),
            date: Some(data.date.unwrap_or(cut)),
            priority: Some(data.priority.unwrap_or(old.priority)),
            order: Some(data.order.unwrap_or(old.order)),
            completed: data
                .completed
                .or(on_cut.map(|(_, completed)| completed))
                .unwrap_or(false),
            recurrence: rule,
            parent_task_id: None,
        })?;

        // The new anchor takes the place of a stored instance on the cut date
        if let Some((id, _)) = on_cut {
            self.remove(id)?;
        }
        if let Some(rule) = self.rule_mut(old.id) {
            end_rule_before(rule, old.date, cut);
        }
        let moved = self.relink_instances(old.id, successor.id, cut, &content_patch(&data))?;

        tracing::debug!(
            parent_id = %old.id,
            successor_id = %successor.id,
            %cut,
            moved,
            "series split"
        );

        let mut touched = Vec::with_capacity(2);
        touched.extend(self.find(old.id).cloned());
        touched.push(successor);
        Ok(touched)
    }

    /// Ends `parent` the day before `date` and continues it as a new series
    /// from the next occurrence, so that `date` alone drops out.
    fn cut_out(&mut self, parent: &Task, date: NaiveDate) -> Result<Option<Task>, CoreError> {
        let successor = match next_occurrence(parent, date) {
            Some(next) => Some(self.insert(NewTaskData {
                title: parent.title.clone(),
                description: parent.description.clone(),
                date: Some(next),
                priority: Some(parent.priority),
                order: Some(parent.order),
                completed: false,
                recurrence: parent
                    .recurrence
                    .as_ref()
                    .and_then(|rule| continue_rule(rule, parent.date, next)),
                parent_task_id: None,
            })?),
            None => None,
        };

        if let Some(rule) = self.rule_mut(parent.id) {
            end_rule_before(rule, parent.date, date);
        }
        if let Some(successor) = &successor {
            self.relink_instances(parent.id, successor.id, date, &UpdateTaskData::default())?;
        }
        Ok(successor)
    }

    /// Moves the instances of `from` dated after `after` to the series `to`,
    /// applying `patch` to each. Returns how many moved.
    fn relink_instances(
        &mut self,
        from: Uuid,
        to: Uuid,
        after: NaiveDate,
        patch: &UpdateTaskData,
    ) -> Result<usize, CoreError> {
        let moved: Vec<Uuid> = self
            .tasks
            .iter()
            .filter(|task| task.parent_task_id == Some(from) && task.date > after)
            .map(|task| task.id)
            .collect();
        for id in &moved {
            if let Some(task) = self.tasks.iter_mut().find(|task| task.id == *id) {
                task.parent_task_id = Some(to);
            }
            self.update(*id, patch.clone())?;
        }
        Ok(moved.len())
    }

    /// Starts the series of `parent` at `next`, keeping what is left of its rule.
    fn restart_series(&mut self, parent: &Task, next: NaiveDate) {
        let rule = parent
            .recurrence
            .as_ref()
            .and_then(|rule| continue_rule(rule, parent.date, next));
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == parent.id) {
            task.date = next;
            task.completed = false;
            task.is_recurring = rule.is_some();
            task.recurrence = rule;
            task.updated_at = Utc::now();
        }
        tracing::debug!(parent_id = %parent.id, %next, "series start moved");
    }

    fn series_point(&self, picked: &Task) -> Result<SeriesPoint, CoreError> {
        let parent_id = picked.effective_parent_id();
        let parent = self
            .find(parent_id)
            .cloned()
            .ok_or_else(|| CoreError::NotFound(parent_id.to_string()))?;
        if parent.active_recurrence().is_none() {
            return Err(CoreError::InvalidInput(format!(
                "Task '{}' is not a recurring series",
                parent.title
            )));
        }

        // A virtual occurrence stands for the stored instance on its date
        let stored = self
            .find(picked.id)
            .filter(|task| task.parent_task_id == Some(parent_id))
            .or_else(|| {
                self.tasks.iter().find(|task| {
                    picked.id != parent_id
                        && task.parent_task_id == Some(parent_id)
                        && task.date == picked.date
                })
            });
        Ok(SeriesPoint {
            date: stored.map_or(picked.date, |task| task.date),
            stored: stored.map(|task| task.id),
            parent,
        })
    }

    fn check_pickable(&self, point: &SeriesPoint) -> Result<(), CoreError> {
        if point.stored.is_some() || is_occurrence(&point.parent, point.date) {
            Ok(())
        } else {
            Err(not_an_occurrence(point))
        }
    }

    fn rule_mut(&mut self, parent_id: Uuid) -> Option<&mut RecurrenceRule> {
        let parent = self.tasks.iter_mut().find(|task| task.id == parent_id)?;
        parent.updated_at = Utc::now();
        parent.recurrence.as_mut()
    }
}

fn check_title(data: &UpdateTaskData) -> Result<(), CoreError> {
    match &data.title {
        Some(title) if title.trim().is_empty() => {
            Err(CoreError::InvalidInput("Task title cannot be empty".to_string()))
        }
        _ => Ok(()),
    }
}

fn not_an_occurrence(point: &SeriesPoint) -> CoreError {
    CoreError::InvalidInput(format!(
        "{} is not an occurrence of '{}'",
        point.date, point.parent.title
    ))
}

fn is_occurrence(parent: &Task, date: NaiveDate) -> bool {
    RecurrenceExpander::for_task(parent).map_or(false, |expander| {
        expander
            .occurrences()
            .take_while(|candidate| *candidate <= date)
            .any(|candidate| candidate == date)
    })
}

fn next_occurrence(parent: &Task, after: NaiveDate) -> Option<NaiveDate> {
    RecurrenceExpander::for_task(parent)?
        .occurrences()
        .find(|date| *date > after)
}

/// Fields an all-series edit copies onto stored instances.
fn content_patch(data: &UpdateTaskData) -> UpdateTaskData {
    UpdateTaskData {
        title: data.title.clone(),
        description: data.description.clone(),
        priority: data.priority,
        ..Default::default()
    }
}

fn occurrences_before(rule: &RecurrenceRule, anchor: NaiveDate, cut: NaiveDate) -> usize {
    RecurrenceExpander::new(anchor, rule)
        .occurrences()
        .take_while(|date| *date < cut)
        .count()
}

/// Limits `rule` to the occurrences before `cut`.
fn end_rule_before(rule: &mut RecurrenceRule, anchor: NaiveDate, cut: NaiveDate) {
    let last = cut.pred_opt().unwrap_or(NaiveDate::MIN);
    match rule.end {
        RecurrenceEnd::Count(_) => {
            let kept = u32::try_from(occurrences_before(rule, anchor, cut)).unwrap_or(u32::MAX);
            if let Some(kept) = NonZeroU32::new(kept) {
                rule.end = RecurrenceEnd::Count(kept);
            }
        }
        RecurrenceEnd::Until(end) if end <= last => {}
        _ => rule.end = RecurrenceEnd::Until(last),
    }
}

/// The rest of `rule` from `cut` on, as a rule anchored at `cut`. `None`
/// when a count is already used up.
fn continue_rule(rule: &RecurrenceRule, anchor: NaiveDate, cut: NaiveDate) -> Option<RecurrenceRule> {
    let mut rest = rule.clone();
    if let RecurrenceEnd::Count(count) = rule.end {
        let used = u32::try_from(occurrences_before(rule, anchor, cut)).unwrap_or(u32::MAX);
        let left = NonZeroU32::new(count.get().saturating_sub(used))?;
        rest.end = RecurrenceEnd::Count(left);
    }
    Some(rest)
}

fn sort_for_display(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        a.date
            .cmp(&b.date)
            .then(a.order.cmp(&b.order))
            .then(a.created_at.cmp(&b.created_at))
    });
}
