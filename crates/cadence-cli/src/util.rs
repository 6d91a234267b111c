use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::{SeriesScope, Task};
use cadence_core::recurrence::materialize_instances;
use cadence_core::store::TaskStore;
use chrono::NaiveDate;
use dialoguer::Select;
use owo_colors::OwoColorize;

/// Resolves a full id or a unique id prefix to the stored task.
pub async fn resolve_task(store: &impl TaskStore, short_id: &str) -> Result<Task> {
    if short_id.len() < 2 {
        return Err(anyhow!(CoreError::InvalidInput(
            "Short ID must be at least 2 characters long.".to_string()
        )));
    }

    let mut tasks = store.find_tasks_by_id_prefix(short_id).await?;
    match tasks.len() {
        1 => Ok(tasks.remove(0)),
        0 => Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID prefix '{}'",
            short_id
        )))),
        _ => {
            let task_info: Vec<(String, String)> = tasks
                .into_iter()
                .map(|t| (t.id.to_string(), t.title))
                .collect();
            Err(anyhow!(CoreError::AmbiguousId(task_info)))
        }
    }
}

/// The parent of the active series `task` belongs to, if any.
pub async fn series_parent(store: &impl TaskStore, task: &Task) -> Result<Option<Task>> {
    let parent = match task.parent_task_id {
        None => Some(task.clone()),
        Some(parent_id) => store.find_task(parent_id).await?,
    };
    Ok(parent.filter(|parent| parent.active_recurrence().is_some()))
}

/// The occurrence a series command starts from: the one on `date`, or `task`
/// itself when no date is given.
pub fn pick_occurrence(task: &Task, parent: &Task, date: Option<NaiveDate>) -> Task {
    match date {
        Some(date) if date != parent.date => materialize_instances(parent, &[date])
            .into_iter()
            .next()
            .unwrap_or_else(|| parent.clone()),
        Some(_) => parent.clone(),
        None => task.clone(),
    }
}

/// `This` for an instance, `All` for the series parent.
pub fn default_scope(picked: &Task) -> SeriesScope {
    if picked.is_instance() {
        SeriesScope::This
    } else {
        SeriesScope::All
    }
}

/// Asks which part of the series `picked` belongs to a change applies to.
pub fn prompt_scope(picked: &Task, action: &str) -> Result<SeriesScope> {
    let options = [
        format!("This occurrence only ({})", picked.date),
        "This and future occurrences".to_string(),
        "Entire series".to_string(),
    ];

    println!("{}", "This task is part of a recurring series.".yellow());
    let selection = Select::new()
        .with_prompt(format!("How would you like to {}?", action))
        .items(&options)
        .default(if picked.is_instance() { 0 } else { 2 })
        .interact()?;

    Ok(match selection {
        0 => SeriesScope::This,
        1 => SeriesScope::Future,
        _ => SeriesScope::All,
    })
}

/// First seven characters of an id, as shown in tables.
pub fn short_id(task: &Task) -> String {
    task.id.to_string()[..7].to_string()
}
