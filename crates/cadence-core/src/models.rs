use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

use crate::calendar::{self, serde_date, weekday_short_name};
use crate::error::CoreError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid task priority: {0}")]
pub struct ParseTaskPriorityError(String);

impl FromStr for TaskPriority {
    type Err = ParseTaskPriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(TaskPriority::Low),
            "medium" => Ok(TaskPriority::Medium),
            "high" => Ok(TaskPriority::High),
            "urgent" => Ok(TaskPriority::Urgent),
            _ => Err(ParseTaskPriorityError(s.to_string())),
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskPriority::Low => write!(f, "low"),
            TaskPriority::Medium => write!(f, "medium"),
            TaskPriority::High => write!(f, "high"),
            TaskPriority::Urgent => write!(f, "urgent"),
        }
    }
}

// ============================================================================
// Recurrence Rules
// ============================================================================

/// Unit a recurrence rule steps in. `None` never repeats.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid recurrence type: {0}")]
pub struct ParseFrequencyError(String);

impl FromStr for Frequency {
    type Err = ParseFrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Frequency::None),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(ParseFrequencyError(s.to_string())),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frequency::None => write!(f, "none"),
            Frequency::Daily => write!(f, "daily"),
            Frequency::Weekly => write!(f, "weekly"),
            Frequency::Monthly => write!(f, "monthly"),
            Frequency::Yearly => write!(f, "yearly"),
        }
    }
}

/// How a series ends. An end date and an occurrence count are mutually exclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RecurrenceEnd {
    #[default]
    Unbounded,
    /// Last allowed occurrence date, inclusive.
    Until(NaiveDate),
    /// Maximum number of occurrences, the anchor included.
    Count(NonZeroU32),
}

/// A recurrence rule carried by the anchor ("parent") task of a series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRecurrenceRule", into = "RawRecurrenceRule")]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Step multiplier; 0 behaves as 1.
    pub interval: u32,
    pub end: RecurrenceEnd,
    /// Weekday numbers, 0 = Sunday. Only used by weekly rules.
    pub weekdays: BTreeSet<u8>,
}

impl Default for RecurrenceRule {
    fn default() -> Self {
        Self::new(Frequency::None)
    }
}

impl RecurrenceRule {
    pub fn new(frequency: Frequency) -> Self {
        Self {
            frequency,
            interval: 1,
            end: RecurrenceEnd::Unbounded,
            weekdays: BTreeSet::new(),
        }
    }

    pub fn none() -> Self {
        Self::new(Frequency::None)
    }

    pub fn daily() -> Self {
        Self::new(Frequency::Daily)
    }

    pub fn weekly() -> Self {
        Self::new(Frequency::Weekly)
    }

    pub fn monthly() -> Self {
        Self::new(Frequency::Monthly)
    }

    pub fn yearly() -> Self {
        Self::new(Frequency::Yearly)
    }

    /// Repeat every `interval` units.
    pub fn every(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Restrict a weekly rule to the given weekday numbers (0 = Sunday).
    /// Numbers outside 0..=6 are ignored.
    pub fn on_weekdays(mut self, weekdays: impl IntoIterator<Item = u8>) -> Self {
        self.weekdays = weekdays.into_iter().filter(|day| *day < 7).collect();
        self
    }

    /// End the series on `date` (inclusive). Replaces any count.
    pub fn until(mut self, date: NaiveDate) -> Self {
        self.end = RecurrenceEnd::Until(date);
        self
    }

    /// End the series after `count` occurrences. Replaces any end date;
    /// a count of zero leaves the series unbounded.
    pub fn times(mut self, count: u32) -> Self {
        self.end = NonZeroU32::new(count).map_or(RecurrenceEnd::Unbounded, RecurrenceEnd::Count);
        self
    }

    /// Whether this rule generates anything beyond its anchor.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.frequency != Frequency::None
    }

    #[inline]
    pub fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        match self.end {
            RecurrenceEnd::Until(date) => Some(date),
            _ => None,
        }
    }

    pub fn count(&self) -> Option<u32> {
        match self.end {
            RecurrenceEnd::Count(count) => Some(count.get()),
            _ => None,
        }
    }
}

impl fmt::Display for RecurrenceRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match self.frequency {
            Frequency::None => return write!(f, "Does not repeat"),
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        };

        let interval = self.effective_interval();
        if interval == 1 {
            write!(f, "Repeats every {}", unit)?;
        } else {
            write!(f, "Repeats every {} {}s", interval, unit)?;
        }

        if self.frequency == Frequency::Weekly && !self.weekdays.is_empty() {
            let days: Vec<&str> = self.weekdays.iter().map(|day| weekday_short_name(*day)).collect();
            write!(f, " on {}", days.join(", "))?;
        }

        match self.end {
            RecurrenceEnd::Unbounded => Ok(()),
            RecurrenceEnd::Until(date) => write!(f, " until {}", calendar::format_calendar_date(date)),
            RecurrenceEnd::Count(count) if count.get() == 1 => write!(f, ", once"),
            RecurrenceEnd::Count(count) => write!(f, ", {} times", count),
        }
    }
}

/// Recurrence rule as it travels on the wire: `{type, interval, endDate?, count?, weekdays?}`.
///
/// Conversion into [`RecurrenceRule`] normalizes instead of failing, except for
/// an unparseable end date.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRecurrenceRule {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default = "default_interval")]
    interval: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    count: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    weekdays: Option<Vec<i64>>,
}

fn default_interval() -> i64 {
    1
}

impl TryFrom<RawRecurrenceRule> for RecurrenceRule {
    type Error = CoreError;

    fn try_from(raw: RawRecurrenceRule) -> Result<Self, Self::Error> {
        let frequency = if raw.kind.is_empty() {
            Frequency::None
        } else {
            raw.kind.parse().unwrap_or_else(|_| {
                tracing::warn!(kind = %raw.kind, "unknown recurrence type, treating as non-recurring");
                Frequency::None
            })
        };

        let interval = match u32::try_from(raw.interval) {
            Ok(interval) if interval > 0 => interval,
            _ => {
                tracing::warn!(interval = raw.interval, "recurrence interval must be positive, using 1");
                1
            }
        };

        let end_date = raw
            .end_date
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .map(calendar::parse_calendar_date)
            .transpose()?;
        let count = raw
            .count
            .and_then(|count| u32::try_from(count).ok())
            .and_then(NonZeroU32::new);

        let end = match (end_date, count) {
            (Some(date), Some(_)) => {
                tracing::warn!(end_date = %date, "recurrence has both endDate and count, keeping endDate");
                RecurrenceEnd::Until(date)
            }
            (Some(date), None) => RecurrenceEnd::Until(date),
            (None, Some(count)) => RecurrenceEnd::Count(count),
            (None, None) => RecurrenceEnd::Unbounded,
        };

        let mut weekdays = BTreeSet::new();
        for day in raw.weekdays.unwrap_or_default() {
            match u8::try_from(day) {
                Ok(day) if day < 7 => {
                    weekdays.insert(day);
                }
                _ => tracing::warn!(weekday = day, "ignoring weekday outside 0..=6"),
            }
        }

        Ok(Self {
            frequency,
            interval,
            end,
            weekdays,
        })
    }
}

impl From<RecurrenceRule> for RawRecurrenceRule {
    fn from(rule: RecurrenceRule) -> Self {
        Self {
            kind: rule.frequency.to_string(),
            interval: i64::from(rule.effective_interval()),
            end_date: rule.end_date().map(calendar::format_calendar_date),
            count: rule.count().map(i64::from),
            weekdays: if rule.weekdays.is_empty() {
                None
            } else {
                Some(rule.weekdays.iter().map(|day| i64::from(*day)).collect())
            },
        }
    }
}

/// Which part of a series an edit or delete applies to.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum SeriesScope {
    /// Only the picked occurrence
    #[default]
    This,
    /// The picked occurrence and every later one
    Future,
    /// The whole series, anchor included
    All,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid series scope: {0}")]
pub struct ParseSeriesScopeError(String);

impl FromStr for SeriesScope {
    type Err = ParseSeriesScopeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "this" => Ok(SeriesScope::This),
            "future" => Ok(SeriesScope::Future),
            "all" => Ok(SeriesScope::All),
            _ => Err(ParseSeriesScopeError(s.to_string())),
        }
    }
}

impl fmt::Display for SeriesScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SeriesScope::This => write!(f, "this"),
            SeriesScope::Future => write!(f, "future"),
            SeriesScope::All => write!(f, "all"),
        }
    }
}

// ============================================================================
// Tasks
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Day this task instance is due
    #[serde(with = "serde_date")]
    pub date: NaiveDate,
    /// Sort key within a day, ascending
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub priority: TaskPriority,
    #[serde(default)]
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Only present on the anchor task of a series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<RecurrenceRule>,
    /// Set on materialized and virtual instances of a series
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<Uuid>,
    #[serde(default)]
    pub is_recurring: bool,
}

impl Default for Task {
    fn default() -> Self {
        Self {
            id: Uuid::new_v4(),
            title: String::new(),
            description: None,
            date: Local::now().date_naive(),
            order: 0,
            priority: TaskPriority::default(),
            completed: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            recurrence: None,
            parent_task_id: None,
            is_recurring: false,
        }
    }
}

impl Task {
    /// The series this task belongs to: its parent, or itself.
    #[inline]
    pub fn effective_parent_id(&self) -> Uuid {
        self.parent_task_id.unwrap_or(self.id)
    }

    /// The rule this task expands, if it is the anchor of an active series.
    pub fn active_recurrence(&self) -> Option<&RecurrenceRule> {
        if self.parent_task_id.is_some() {
            return None;
        }
        self.recurrence.as_ref().filter(|rule| rule.is_active())
    }

    #[inline]
    pub fn is_instance(&self) -> bool {
        self.parent_task_id.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewTaskData {
    pub title: String,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    pub priority: Option<TaskPriority>,
    /// Explicit position within the day; appended at the end when absent
    pub order: Option<i64>,
    pub completed: bool,
    /// Makes the new task the anchor of a series
    pub recurrence: Option<RecurrenceRule>,
    /// Links the new task to an existing series as a materialized instance
    pub parent_task_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateTaskData {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date: Option<NaiveDate>,
    pub order: Option<i64>,
    pub priority: Option<TaskPriority>,
    pub completed: Option<bool>,
    pub recurrence: Option<Option<RecurrenceRule>>,
}
