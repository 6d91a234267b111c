use anyhow::Result;
use cadence_core::calendar::{tasks_on, ViewWindow};
use cadence_core::reorder::{plan_move, MoveRequest};
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use crate::cli::MoveCommand;
use crate::parser::parse_day;
use crate::util::resolve_task;

pub async fn move_task(store: &impl TaskStore, command: MoveCommand) -> Result<()> {
    let task = resolve_task(store, &command.id).await?;
    let destination = match &command.date {
        Some(input) => parse_day(input)?,
        None => task.date,
    };

    let source_tasks = store.list_tasks_in_range(&ViewWindow::single_day(task.date)).await?;
    let destination_tasks = store
        .list_tasks_in_range(&ViewWindow::single_day(destination))
        .await?;
    let source_day = tasks_on(&source_tasks, task.date);
    let destination_day = tasks_on(&destination_tasks, destination);

    let request = MoveRequest::between_days(
        &task,
        &source_day,
        destination,
        &destination_day,
        command.position,
    );
    let updates = plan_move(&request);

    if updates.is_empty() {
        println!("'{}' is already at that position.", task.title);
        return Ok(());
    }

    store.batch_reorder(&updates).await?;

    let moved = updates.iter().find(|update| update.id == task.id);
    println!(
        "{} Moved {} to {} at position {}",
        "✓".style(Style::new().green().bold()),
        task.title.bright_white().bold(),
        destination,
        moved.map_or(0, |update| update.order)
    );
    if task.active_recurrence().is_some() && destination != task.date {
        println!(
            "  {} The series now starts on {}",
            "→".style(Style::new().blue()),
            destination
        );
    }
    tracing::debug!(task_id = %task.id, updates = updates.len(), "reorder applied");

    Ok(())
}
