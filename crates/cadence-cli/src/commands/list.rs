use anyhow::Result;
use cadence_core::calendar::{month_window, week_window, ViewWindow};
use cadence_core::expansion::expand_view;
use cadence_core::store::TaskStore;
use chrono::{Datelike, Local};

use crate::cli::{ListCommand, ViewKind};
use crate::config::Config;
use crate::parser::parse_day;
use crate::views::table::display_agenda;

pub async fn list_tasks(store: &impl TaskStore, command: ListCommand, config: &Config) -> Result<()> {
    let window = window_for(&command, config)?;
    let tasks = store.list_tasks_in_range(&window).await?;
    let expanded = expand_view(&tasks, &window, &config.expansion);

    tracing::debug!(
        window = %window,
        stored = tasks.len(),
        shown = expanded.len(),
        "agenda expanded"
    );
    display_agenda(&window, &expanded);

    Ok(())
}

fn window_for(command: &ListCommand, config: &Config) -> Result<ViewWindow> {
    let day = match &command.date {
        Some(input) => parse_day(input)?,
        None => Local::now().date_naive(),
    };

    let window = match command.view.unwrap_or(config.default_view) {
        ViewKind::Week => week_window(day, config.week_start)?,
        ViewKind::Month => month_window(day.year(), day.month(), config.week_start)?,
    };
    Ok(window)
}
