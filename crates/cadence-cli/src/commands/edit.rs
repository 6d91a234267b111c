use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::models::{SeriesScope, Task, UpdateTaskData};
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use crate::cli::EditCommand;
use crate::parser::{parse_day, parse_recurrence};
use crate::util::{default_scope, pick_occurrence, prompt_scope, resolve_task, series_parent};

pub async fn edit_task(store: &impl TaskStore, command: EditCommand) -> Result<()> {
    let task = resolve_task(store, &command.id).await?;
    let update_data = update_from_flags(&command)?;
    if is_empty(&update_data) {
        return Err(anyhow!(CoreError::InvalidInput(
            "Nothing to change; pass at least one field to edit".to_string()
        )));
    }

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    let Some(parent) = series_parent(store, &task).await? else {
        if command.occurrence.is_some() {
            return Err(anyhow!(CoreError::InvalidInput(format!(
                "Task '{}' is not a recurring series; omit --occurrence",
                task.title
            ))));
        }
        let updated = store.update_task(task.id, update_data).await?;
        println!(
            "{} Updated task: {}",
            "✓".style(success_style),
            updated.title.bright_white().bold()
        );
        print_rule(&updated);
        return Ok(());
    };

    let occurrence = command.occurrence.as_deref().map(parse_day).transpose()?;
    let picked = pick_occurrence(&task, &parent, occurrence);
    let scope = match command.scope {
        Some(scope) => scope,
        None if command.force_scope => default_scope(&picked),
        None => prompt_scope(&picked, "apply your changes")?,
    };

    if scope == SeriesScope::This && update_data.recurrence.is_some() {
        return Err(anyhow!(CoreError::InvalidInput(
            "A single occurrence cannot change the rule; use --scope future or all".to_string()
        )));
    }

    let touched = store.update_series(&picked, update_data, scope).await?;
    match (scope, touched.as_slice()) {
        (SeriesScope::This, [occurrence, ..]) => {
            println!(
                "{} Updated occurrence: {} ({})",
                "✓".style(success_style),
                occurrence.title.bright_white().bold(),
                occurrence.date
            );
        }
        (SeriesScope::Future, [_, successor, ..]) if successor.parent_task_id.is_none() => {
            println!(
                "{} Split series: {}",
                "✓".style(success_style),
                successor.title.bright_white().bold()
            );
            println!("  {} Task ID: {}", "→".style(info_style), successor.id.to_string().yellow());
            println!("  {} Starts: {}", "→".style(info_style), successor.date);
            print_rule(successor);
        }
        (_, [series, ..]) => {
            println!(
                "{} Updated series: {}",
                "✓".style(success_style),
                series.title.bright_white().bold()
            );
            print_rule(series);
        }
        (_, []) => {}
    }

    Ok(())
}

fn update_from_flags(command: &EditCommand) -> Result<UpdateTaskData> {
    let description = if command.description_clear {
        Some(None)
    } else {
        command.description.clone().map(Some)
    };

    let recurrence = if command.recurrence_clear {
        Some(None)
    } else {
        parse_recurrence(&command.repeat)?.map(Some)
    };

    Ok(UpdateTaskData {
        title: command.title.clone(),
        description,
        date: command.date.as_deref().map(parse_day).transpose()?,
        priority: command.priority,
        recurrence,
        ..Default::default()
    })
}

fn is_empty(data: &UpdateTaskData) -> bool {
    data.title.is_none()
        && data.description.is_none()
        && data.date.is_none()
        && data.priority.is_none()
        && data.recurrence.is_none()
}

fn print_rule(task: &Task) {
    let info_style = Style::new().blue();
    match &task.recurrence {
        Some(rule) => println!("  {} {}", "→".style(info_style), rule),
        None => println!("  {} Does not repeat", "→".style(info_style)),
    }
}
