//! Merges persisted tasks with the virtual instances of recurring series that
//! fall inside the visible window.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::calendar::ViewWindow;
use crate::models::Task;
use crate::recurrence::{materialize_instances, should_expand, RecurrenceExpander};

/// Tuning for view expansion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    /// Extra days searched past the window so interval gaps never starve it
    pub margin_days: u32,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self { margin_days: 30 }
    }
}

/// Every persisted task plus every virtual occurrence inside `window` that is
/// not already covered by a persisted task of the same series.
///
/// Persisted tasks come first, unmodified and in input order; generated
/// instances follow, grouped per parent in date order. The result is a pure
/// function of the inputs.
pub fn expand_view(tasks: &[Task], window: &ViewWindow, config: &ExpansionConfig) -> Vec<Task> {
    let covered: HashSet<(Uuid, NaiveDate)> = tasks
        .iter()
        .map(|task| (task.effective_parent_id(), task.date))
        .collect();

    let mut expanded = tasks.to_vec();
    let mut seen_parents = HashSet::new();

    for parent in tasks.iter().filter(|task| should_expand(task, window)) {
        if !seen_parents.insert(parent.id) {
            tracing::warn!(task_id = %parent.id, "duplicate parent task in input, expanding once");
            continue;
        }
        let Some(expander) = RecurrenceExpander::for_task(parent) else {
            continue;
        };

        let dates: Vec<NaiveDate> = expander
            .generate_occurrence_dates(search_span(parent.date, window, config))
            .into_iter()
            .filter(|date| window.contains(*date) && !covered.contains(&(parent.id, *date)))
            .collect();

        tracing::debug!(
            task_id = %parent.id,
            window = %window,
            generated = dates.len(),
            "expanded recurring task"
        );
        expanded.extend(materialize_instances(parent, &dates));
    }

    expanded
}

/// Days past the anchor the expander must search to cover the whole window.
fn search_span(anchor: NaiveDate, window: &ViewWindow, config: &ExpansionConfig) -> u32 {
    let lead = (window.start - anchor).num_days().max(0).unsigned_abs();
    let span = lead
        .saturating_add(window.span_days())
        .saturating_add(u64::from(config.margin_days));
    u32::try_from(span).unwrap_or(u32::MAX)
}

/// Memoized [`expand_view`] for a render loop.
///
/// The expansion is recomputed only when the task list or the window differs
/// from the previous call.
#[derive(Debug, Default)]
pub struct ViewExpansionCache {
    config: ExpansionConfig,
    memo: Option<Memo>,
}

#[derive(Debug)]
struct Memo {
    tasks: Vec<Task>,
    window: ViewWindow,
    expanded: Vec<Task>,
}

impl ViewExpansionCache {
    pub fn new(config: ExpansionConfig) -> Self {
        Self { config, memo: None }
    }

    pub fn config(&self) -> &ExpansionConfig {
        &self.config
    }

    /// The merged task list for `tasks` seen through `window`.
    pub fn expand(&mut self, tasks: &[Task], window: &ViewWindow) -> &[Task] {
        let fresh = self
            .memo
            .as_ref()
            .is_some_and(|memo| memo.window == *window && memo.tasks == tasks);

        if fresh {
            tracing::trace!(window = %window, "view expansion cache hit");
        } else {
            tracing::debug!(window = %window, tasks = tasks.len(), "view expansion cache miss");
            self.memo = None;
        }

        let config = &self.config;
        &self
            .memo
            .get_or_insert_with(|| Memo {
                tasks: tasks.to_vec(),
                window: *window,
                expanded: expand_view(tasks, window, config),
            })
            .expanded
    }

    /// Drops the memoized expansion.
    pub fn invalidate(&mut self) {
        self.memo = None;
    }
}
