use anyhow::{anyhow, Result};
use cadence_core::calendar::ViewWindow;
use cadence_core::error::CoreError;
use cadence_core::models::{Task, UpdateTaskData};
use cadence_core::store::{materialize_occurrence, TaskStore};
use chrono::NaiveDate;
use owo_colors::{OwoColorize, Style};

use crate::cli::DoneCommand;
use crate::parser::parse_day;
use crate::util::resolve_task;

pub async fn complete_task(store: &impl TaskStore, command: DoneCommand) -> Result<()> {
    let task = resolve_task(store, &command.id).await?;

    let completed = match &command.date {
        Some(input) => complete_occurrence(store, &task, parse_day(input)?).await?,
        None => mark_completed(store, &task).await?,
    };

    println!(
        "{} Completed: {} ({})",
        "✓".style(Style::new().green().bold()),
        completed.title.bright_white().bold(),
        completed.date
    );
    Ok(())
}

/// Completes one occurrence of a series, storing it first if it is virtual.
async fn complete_occurrence(store: &impl TaskStore, parent: &Task, date: NaiveDate) -> Result<Task> {
    if parent.active_recurrence().is_none() {
        return Err(anyhow!(CoreError::InvalidInput(format!(
            "Task '{}' is not a recurring series; omit --date",
            parent.title
        ))));
    }
    if date == parent.date {
        return mark_completed(store, parent).await;
    }

    let stored = store
        .list_tasks_in_range(&ViewWindow::single_day(date))
        .await?
        .into_iter()
        .find(|task| task.parent_task_id == Some(parent.id) && task.date == date);

    match stored {
        Some(instance) => mark_completed(store, &instance).await,
        None => Ok(materialize_occurrence(store, parent, date, true).await?),
    }
}

async fn mark_completed(store: &impl TaskStore, task: &Task) -> Result<Task> {
    let updated = store
        .update_task(
            task.id,
            UpdateTaskData {
                completed: Some(true),
                ..Default::default()
            },
        )
        .await?;
    Ok(updated)
}
