use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::recurrence::RecurrenceExpander;
use cadence_core::store::TaskStore;
use owo_colors::OwoColorize;

use crate::cli::PreviewCommand;
use crate::parser::parse_day;
use crate::util::resolve_task;
use crate::views::table::display_occurrences;

pub async fn preview_series(store: &impl TaskStore, command: PreviewCommand) -> Result<()> {
    let task = resolve_task(store, &command.id).await?;

    let expander = RecurrenceExpander::for_task(&task).ok_or_else(|| {
        anyhow!(CoreError::InvalidInput(format!(
            "Task '{}' is not a recurring series",
            task.title
        )))
    })?;
    let from = match &command.from {
        Some(input) => parse_day(input)?,
        None => task.date,
    };

    println!("{} {}", task.title.bright_white().bold(), expander.rule().to_string().bright_black());
    display_occurrences(&task, &expander.preview(from, command.count));
    Ok(())
}
