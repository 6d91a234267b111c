//! Calendar-day helpers shared by the expansion engine, the stores and the CLI.
//!
//! Everything here works at whole-day granularity: dates are [`NaiveDate`]s and
//! a visible range is an inclusive [`ViewWindow`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::CoreError;
use crate::models::Task;

/// Wire and display format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a calendar date.
///
/// Accepts plain `YYYY-MM-DD` as well as timestamps such as
/// `2025-06-09T00:00:00.000Z`, in which case the date part as written is used.
pub fn parse_calendar_date(input: &str) -> Result<NaiveDate, CoreError> {
    let trimmed = input.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return Ok(date);
    }
    if let Ok(timestamp) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(timestamp.naive_local().date());
    }
    if let Ok(timestamp) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(timestamp.date());
    }

    Err(CoreError::InvalidDate(format!(
        "'{}' is not a calendar date (expected YYYY-MM-DD)",
        input
    )))
}

/// Formats a date the way it travels on the wire.
pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Serde adapter for `NaiveDate` fields using [`parse_calendar_date`].
pub mod serde_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&date.format(super::DATE_FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        super::parse_calendar_date(&raw).map_err(serde::de::Error::custom)
    }
}

/// First day of a displayed week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    fn days_into_week(self, date: NaiveDate) -> u64 {
        let weekday = date.weekday();
        let offset = match self {
            WeekStart::Monday => weekday.num_days_from_monday(),
            WeekStart::Sunday => weekday.num_days_from_sunday(),
        };
        u64::from(offset)
    }
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid week start: {0}")]
pub struct ParseWeekStartError(String);

impl FromStr for WeekStart {
    type Err = ParseWeekStartError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monday" | "mon" => Ok(WeekStart::Monday),
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            _ => Err(ParseWeekStartError(s.to_string())),
        }
    }
}

/// Inclusive range of calendar days currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ViewWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidInput(format!(
                "view window starts after it ends ({} > {})",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// A window covering exactly one day.
    pub fn single_day(date: NaiveDate) -> Self {
        Self { start: date, end: date }
    }

    #[inline]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Number of days between start and end (0 for a single-day window).
    pub fn span_days(&self) -> u64 {
        (self.end - self.start).num_days().unsigned_abs()
    }

    /// Iterates every day of the window in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |day| *day <= end)
    }
}

impl fmt::Display for ViewWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start.format(DATE_FORMAT), self.end.format(DATE_FORMAT))
    }
}

/// The seven-day window containing `date`.
pub fn week_window(date: NaiveDate, week_start: WeekStart) -> Result<ViewWindow, CoreError> {
    let start = date
        .checked_sub_days(Days::new(week_start.days_into_week(date)))
        .ok_or_else(|| CoreError::InvalidDate(format!("no week around {}", date)))?;
    let end = start
        .checked_add_days(Days::new(6))
        .ok_or_else(|| CoreError::InvalidDate(format!("no week around {}", date)))?;
    ViewWindow::new(start, end)
}

/// The month grid for `year`/`month`, padded to whole weeks on both sides.
pub fn month_window(year: i32, month: u32, week_start: WeekStart) -> Result<ViewWindow, CoreError> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CoreError::InvalidDate(format!("{}-{:02} is not a month", year, month)))?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(|| CoreError::InvalidDate(format!("{}-{:02} is out of range", year, month)))?;

    let start = first
        .checked_sub_days(Days::new(week_start.days_into_week(first)))
        .ok_or_else(|| CoreError::InvalidDate(format!("{}-{:02} is out of range", year, month)))?;
    let end = last
        .checked_add_days(Days::new(6 - week_start.days_into_week(last)))
        .ok_or_else(|| CoreError::InvalidDate(format!("{}-{:02} is out of range", year, month)))?;

    ViewWindow::new(start, end)
}

/// Day of week as the 0 (Sunday) to 6 (Saturday) number used by recurrence rules.
#[inline]
pub fn weekday_number(date: NaiveDate) -> u8 {
    // num_days_from_sunday is always < 7
    date.weekday().num_days_from_sunday() as u8
}

/// Short English name for a 0 (Sunday) to 6 (Saturday) weekday number.
pub fn weekday_short_name(day: u8) -> &'static str {
    const NAMES: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
    NAMES.get(usize::from(day)).copied().unwrap_or("?")
}

/// Parses `mon`, `monday`, `1` and friends into a weekday number.
pub fn parse_weekday(input: &str) -> Result<u8, CoreError> {
    let trimmed = input.trim();
    if let Ok(number) = trimmed.parse::<u8>() {
        if number < 7 {
            return Ok(number);
        }
    }
    trimmed
        .parse::<Weekday>()
        .map(|weekday| weekday.num_days_from_sunday() as u8)
        .map_err(|_| CoreError::InvalidInput(format!("'{}' is not a weekday", input)))
}

/// Tasks due on `date`, ordered by `order`. Ties keep their input order.
pub fn tasks_on(tasks: &[Task], date: NaiveDate) -> Vec<&Task> {
    let mut day: Vec<&Task> = tasks.iter().filter(|task| task.date == date).collect();
    day.sort_by_key(|task| task.order);
    day
}

/// Buckets tasks per day, each bucket ordered by `order` (stable).
pub fn group_by_day(tasks: &[Task]) -> BTreeMap<NaiveDate, Vec<&Task>> {
    let mut days: BTreeMap<NaiveDate, Vec<&Task>> = BTreeMap::new();
    for task in tasks {
        days.entry(task.date).or_default().push(task);
    }
    for day in days.values_mut() {
        day.sort_by_key(|task| task.order);
    }
    days
}
