use clap::{Args, Parser, Subcommand, ValueEnum};
use cadence_core::models::{Frequency, SeriesScope, TaskPriority};

/// Cadence: a calendar-style task manager with recurring series
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Add a new task or recurring series
    Add(AddCommand),
    /// Show the week or month agenda, recurring series expanded
    List(ListCommand),
    /// Show the details of a task
    Show(ShowCommand),
    /// Edit a task, an occurrence or a recurring series
    Edit(EditCommand),
    /// Preview upcoming occurrences of a recurring series
    Preview(PreviewCommand),
    /// Move a task to another position or day
    Move(MoveCommand),
    /// Mark a task or a single occurrence as completed
    Done(DoneCommand),
    /// Delete a task, an occurrence or part of a series
    Delete(DeleteCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct AddCommand {
    /// The title of the task
    pub title: String,
    /// The description of the task
    #[clap(short, long)]
    pub description: Option<String>,
    /// The day of the task (e.g. '2024-06-01', 'tomorrow', 'next friday')
    #[clap(short = 'D', long)]
    pub date: Option<String>,
    /// The priority of the task (low, medium, high, urgent)
    #[clap(short, long)]
    pub priority: Option<TaskPriority>,
    #[command(flatten)]
    pub repeat: RecurrenceArgs,
}

/// Flags describing a recurrence rule
#[derive(Args, Debug, Clone, Default)]
pub struct RecurrenceArgs {
    /// Repeat the task (daily, weekly, monthly, yearly)
    #[clap(long)]
    pub every: Option<Frequency>,
    /// Repeat every N units (defaults to 1)
    #[clap(long, requires = "every")]
    pub interval: Option<u32>,
    /// Days of week for weekly repetition (e.g. 'mon,wed,fri')
    #[clap(long, requires = "every")]
    pub on: Option<String>,
    /// Last day of the series, inclusive
    #[clap(long, requires = "every", conflicts_with = "count")]
    pub until: Option<String>,
    /// Maximum number of occurrences
    #[clap(long, requires = "every")]
    pub count: Option<u32>,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// Which grid to show
    #[clap(short, long, value_enum)]
    pub view: Option<ViewKind>,
    /// Any day inside the period to show (defaults to today)
    #[clap(short = 'D', long)]
    pub date: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewKind {
    Week,
    Month,
}

#[derive(Parser, Debug, Clone)]
pub struct ShowCommand {
    /// The ID (or unique ID prefix) of the task
    pub id: String,
}

#[derive(Parser, Debug, Clone)]
pub struct PreviewCommand {
    /// The ID (or unique ID prefix) of the series
    pub id: String,
    /// Number of occurrences to show
    #[clap(short = 'n', long, default_value_t = 5)]
    pub count: usize,
    /// Show occurrences on or after this day (defaults to the series start)
    #[clap(long)]
    pub from: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct MoveCommand {
    /// The ID (or unique ID prefix) of the task to move
    pub id: String,
    /// Destination day (defaults to the task's current day)
    #[clap(short = 'D', long)]
    pub date: Option<String>,
    /// Zero-based position on the destination day (defaults to the end)
    #[clap(short, long)]
    pub position: Option<usize>,
}

#[derive(Parser, Debug, Clone)]
pub struct DoneCommand {
    /// The ID (or unique ID prefix) of the task
    pub id: String,
    /// For a recurring series: the occurrence to complete
    #[clap(short = 'D', long)]
    pub date: Option<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct EditCommand {
    /// The ID (or unique ID prefix) of the task or series
    pub id: String,
    /// For a recurring series: the occurrence to start from
    #[clap(long)]
    pub occurrence: Option<String>,
    /// Which part of a series to change (this, future, all)
    #[clap(long)]
    pub scope: Option<SeriesScope>,
    /// Use the default scope instead of prompting
    #[clap(long, conflicts_with = "scope")]
    pub force_scope: bool,
    /// New title
    #[clap(long)]
    pub title: Option<String>,
    /// New description
    #[clap(short, long)]
    pub description: Option<String>,
    /// Remove the description
    #[clap(long, conflicts_with = "description")]
    pub description_clear: bool,
    /// New day (moves the anchor when editing a whole series)
    #[clap(short = 'D', long)]
    pub date: Option<String>,
    /// New priority (low, medium, high, urgent)
    #[clap(short, long)]
    pub priority: Option<TaskPriority>,
    /// Replace the recurrence rule
    #[command(flatten)]
    pub repeat: RecurrenceArgs,
    /// Stop repeating
    #[clap(long, conflicts_with = "every")]
    pub recurrence_clear: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct DeleteCommand {
    /// The ID (or unique ID prefix) of the task to delete
    pub id: String,
    /// For a recurring series: the occurrence to start from
    #[clap(long)]
    pub occurrence: Option<String>,
    /// Which part of a series to delete (this, future, all)
    #[clap(long)]
    pub scope: Option<SeriesScope>,
    /// Skip the confirmation prompt
    #[clap(short, long)]
    pub force: bool,
}
