use cadence_core::calendar::{format_calendar_date, group_by_day, ViewWindow};
use cadence_core::models::{Task, TaskPriority};
use chrono::{Local, NaiveDate};
use comfy_table::{Attribute, Cell, Color, Row, Table};

use crate::util::short_id;

const RECURRING_MARK: char = '↻';

/// Agenda of `tasks` over `window`, one block of rows per day with tasks.
pub fn agenda_table(window: &ViewWindow, tasks: &[Task]) -> Table {
    let today = Local::now().date_naive();
    let mut table = Table::new();
    table.set_header(vec!["Date", "ID", "Title", "Priority", "Status"]);

    for (date, day) in group_by_day(tasks)
        .into_iter()
        .filter(|(date, _)| window.contains(*date))
    {
        for (position, task) in day.iter().enumerate() {
            let mut row = Row::new();
            row.add_cell(if position == 0 {
                day_cell(date, today)
            } else {
                Cell::new("")
            });
            row.add_cell(id_cell(task));
            row.add_cell(title_cell(task));
            row.add_cell(priority_cell(task.priority));
            row.add_cell(if task.completed {
                Cell::new("done").fg(Color::Green)
            } else {
                Cell::new("open")
            });
            table.add_row(row);
        }
    }

    table
}

pub fn display_agenda(window: &ViewWindow, tasks: &[Task]) {
    println!("Agenda {} to {}", format_calendar_date(window.start), format_calendar_date(window.end));
    if !tasks.iter().any(|task| window.contains(task.date)) {
        println!("No tasks found.");
        return;
    }
    println!("{}", agenda_table(window, tasks));
}

/// Key/value table with every field of one task.
pub fn task_details_table(task: &Task) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Field", "Value"]);

    let repeats = match (&task.recurrence, task.parent_task_id) {
        (Some(rule), _) => rule.to_string(),
        (None, Some(parent_id)) => format!("Instance of {}", parent_id),
        (None, None) => "Does not repeat".to_string(),
    };

    table.add_row(vec!["ID".to_string(), task.id.to_string()]);
    table.add_row(vec!["Title".to_string(), task.title.clone()]);
    table.add_row(vec![
        "Description".to_string(),
        task.description.clone().unwrap_or_else(|| "None".to_string()),
    ]);
    table.add_row(vec!["Date".to_string(), format_calendar_date(task.date)]);
    table.add_row(vec!["Order".to_string(), task.order.to_string()]);
    table.add_row(vec!["Priority".to_string(), task.priority.to_string()]);
    table.add_row(vec!["Completed".to_string(), task.completed.to_string()]);
    table.add_row(vec!["Repeats".to_string(), repeats]);
    table.add_row(vec!["Created".to_string(), task.created_at.to_rfc3339()]);
    table.add_row(vec!["Updated".to_string(), task.updated_at.to_rfc3339()]);
    table
}

pub fn display_task_details(task: &Task) {
    println!("{}", task_details_table(task));
}

pub fn display_occurrences(task: &Task, dates: &[NaiveDate]) {
    if dates.is_empty() {
        println!("No upcoming occurrences.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Date", "Weekday"]);
    for (index, date) in dates.iter().enumerate() {
        let mut cell = Cell::new(format_calendar_date(*date));
        if *date == task.date {
            cell = cell.add_attribute(Attribute::Bold);
        }
        table.add_row(vec![
            Cell::new(index + 1),
            cell,
            Cell::new(date.format("%a")),
        ]);
    }
    println!("{table}");
}

fn day_cell(date: NaiveDate, today: NaiveDate) -> Cell {
    let cell = Cell::new(format!("{} {}", date.format("%a"), format_calendar_date(date)));
    if date == today {
        cell.fg(Color::Yellow).add_attribute(Attribute::Bold)
    } else if date < today {
        cell.fg(Color::DarkGrey)
    } else {
        cell
    }
}

/// Virtual occurrences have no stored id of their own; they show their
/// series id with a marker.
fn id_cell(task: &Task) -> Cell {
    match task.parent_task_id {
        Some(parent_id) if task.id == cadence_core::recurrence::synthetic_instance_id(parent_id, task.date) => {
            let parent = parent_id.to_string();
            Cell::new(format!("{} {}", RECURRING_MARK, &parent[..7])).fg(Color::DarkGrey)
        }
        _ => Cell::new(short_id(task)),
    }
}

fn title_cell(task: &Task) -> Cell {
    let mut title = String::new();
    if task.active_recurrence().is_some() || task.is_instance() {
        title.push(RECURRING_MARK);
        title.push(' ');
    }
    title.push_str(&task.title);

    let cell = Cell::new(title);
    if task.completed {
        cell.add_attribute(Attribute::CrossedOut).fg(Color::DarkGrey)
    } else {
        cell
    }
}

fn priority_cell(priority: TaskPriority) -> Cell {
    let cell = Cell::new(priority.to_string());
    match priority {
        TaskPriority::Urgent => cell.fg(Color::Red).add_attribute(Attribute::Bold),
        TaskPriority::High => cell.fg(Color::Red),
        TaskPriority::Medium => cell.fg(Color::Yellow),
        TaskPriority::Low => cell.fg(Color::Green),
    }
}
