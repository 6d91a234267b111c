use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::{SeriesScope, Task};
use cadence_core::store::TaskStore;
use dialoguer::Confirm;
use owo_colors::{OwoColorize, Style};

use crate::cli::DeleteCommand;
use crate::parser::parse_day;
use crate::util::{default_scope, pick_occurrence, prompt_scope, resolve_task, series_parent};

pub async fn delete_task(store: &impl TaskStore, command: DeleteCommand) -> Result<()> {
    let task = resolve_task(store, &command.id).await?;

    if command.occurrence.is_some() || command.scope.is_some() {
        return delete_from_series(store, &task, &command).await;
    }

    if !command.force {
        let instances = store
            .list_tasks()
            .await?
            .iter()
            .filter(|candidate| candidate.parent_task_id == Some(task.id))
            .count();
        let prompt = if instances > 0 {
            format!(
                "Delete series '{}' and its {} stored occurrence(s)?",
                task.title, instances
            )
        } else {
            format!("Are you sure you want to delete task '{}'?", task.title)
        };

        if !confirm(prompt) {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    store.delete_task(task.id).await?;
    println!(
        "{} Deleted task: {}",
        "✓".style(Style::new().green().bold()),
        task.title.bright_white().bold()
    );
    Ok(())
}

async fn delete_from_series(store: &impl TaskStore, task: &Task, command: &DeleteCommand) -> Result<()> {
    let parent = series_parent(store, task).await?.ok_or_else(|| {
        anyhow!(CoreError::InvalidInput(format!(
            "Task '{}' is not part of a recurring series; omit --occurrence and --scope",
            task.title
        )))
    })?;

    let occurrence = command.occurrence.as_deref().map(parse_day).transpose()?;
    let picked = pick_occurrence(task, &parent, occurrence);
    let scope = match command.scope {
        Some(scope) => scope,
        None if command.force => default_scope(&picked),
        None => prompt_scope(&picked, "delete")?,
    };

    if !command.force {
        let prompt = match scope {
            SeriesScope::This => format!("Delete the {} occurrence of '{}'?", picked.date, parent.title),
            SeriesScope::Future => format!("Delete '{}' from {} on?", parent.title, picked.date),
            SeriesScope::All => format!("Delete the whole series '{}'?", parent.title),
        };
        if !confirm(prompt) {
            println!("Deletion cancelled.");
            return Ok(());
        }
    }

    let removed = store.delete_series(&picked, scope).await?;
    let success_style = Style::new().green().bold();
    match scope {
        SeriesScope::This => println!(
            "{} Deleted occurrence: {} ({})",
            "✓".style(success_style),
            parent.title.bright_white().bold(),
            picked.date
        ),
        SeriesScope::Future if picked.date > parent.date => println!(
            "{} Ended series: {} (last day {})",
            "✓".style(success_style),
            parent.title.bright_white().bold(),
            picked.date.pred_opt().unwrap_or(picked.date)
        ),
        _ => println!(
            "{} Deleted series: {} ({} task(s) removed)",
            "✓".style(success_style),
            parent.title.bright_white().bold(),
            removed
        ),
    }
    Ok(())
}

fn confirm(prompt: String) -> bool {
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}
