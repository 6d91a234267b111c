//! # Cadence Core Library
//!
//! Calendar-style task management with recurring series that are expanded
//! on demand for the visible view, and drag-and-drop reordering within and
//! across days.
//!
//! ## Features
//!
//! - **Recurrence Expansion**: Daily, weekly (with weekday sets), monthly and
//!   yearly rules with intervals, end dates and occurrence counts
//! - **View Merging**: Virtual instances are merged with stored tasks without
//!   duplicating dates a series already has stored
//! - **Memoized Views**: Expansion is recomputed only when the task list or
//!   the visible window changes
//! - **Reorder Planning**: Minimal `(id, order, date)` batches for drops
//! - **Series Scopes**: Edit or delete one occurrence, the rest of a series
//!   or all of it
//!
//! ## Core Modules
//!
//! - [`models`]: Tasks, priorities and recurrence rules
//! - [`calendar`]: Date parsing, view windows and day grouping
//! - [`recurrence`]: Occurrence generation and instance materialization
//! - [`expansion`]: View expansion and the memoizing cache
//! - [`reorder`]: Drag-and-drop reorder planning
//! - [`store`]: Persistence trait with memory and JSON file stores
//! - [`error`]: Error types
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use cadence_core::{
//!     calendar::{week_window, WeekStart},
//!     expansion::ViewExpansionCache,
//!     models::{NewTaskData, RecurrenceRule},
//!     store::{JsonFileTaskStore, TaskStore},
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cadence_core::error::CoreError> {
//!     let store = JsonFileTaskStore::open("tasks.json").await?;
//!
//!     let standup = store
//!         .create_task(NewTaskData {
//!             title: "Standup".to_string(),
//!             recurrence: Some(RecurrenceRule::weekly().on_weekdays([1, 2, 3, 4, 5])),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     let window = week_window(standup.date, WeekStart::Monday)?;
//!     let tasks = store.list_tasks_in_range(&window).await?;
//!
//!     let mut cache = ViewExpansionCache::default();
//!     for task in cache.expand(&tasks, &window) {
//!         println!("{} {}", task.date, task.title);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod calendar;
pub mod error;
pub mod expansion;
pub mod models;
pub mod recurrence;
pub mod reorder;
pub mod store;
