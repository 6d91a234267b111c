use anyhow::Result;
use cadence_core::models::NewTaskData;
use cadence_core::store::TaskStore;
use owo_colors::{OwoColorize, Style};

use crate::cli::AddCommand;
use crate::parser::{parse_day, parse_recurrence};

pub async fn add_task(store: &impl TaskStore, command: AddCommand) -> Result<()> {
    let date = command.date.as_deref().map(parse_day).transpose()?;
    let recurrence = parse_recurrence(&command.repeat)?;

    let added_task = store
        .create_task(NewTaskData {
            title: command.title,
            description: command.description,
            date,
            priority: command.priority,
            recurrence,
            ..Default::default()
        })
        .await?;

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();

    match &added_task.recurrence {
        Some(rule) => {
            println!(
                "{} Created recurring task: {}",
                "✓".style(success_style),
                added_task.title.bright_white().bold()
            );
            println!("  {} Task ID: {}", "→".style(info_style), added_task.id.to_string().yellow());
            println!("  {} Starts: {}", "→".style(info_style), added_task.date);
            println!("  {} {}", "→".style(info_style), rule);
            println!(
                "  {} Use 'cadence preview {}' to see upcoming occurrences",
                "→".style(info_style),
                &added_task.id.to_string()[..8]
            );
        }
        None => {
            println!(
                "{} Created task: {}",
                "✓".style(success_style),
                added_task.title.bright_white().bold()
            );
            println!("  {} Task ID: {}", "→".style(info_style), added_task.id.to_string().yellow());
            println!("  {} Date: {}", "→".style(info_style), added_task.date);
        }
    }

    Ok(())
}
