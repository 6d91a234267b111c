use anyhow::{anyhow, Result};
use cadence_core::calendar::{parse_calendar_date, parse_weekday};
use cadence_core::error::CoreError;
use cadence_core::models::{Frequency, RecurrenceRule};
use chrono::{Local, NaiveDate};
use chrono_english::{parse_date_string, Dialect};
use std::collections::BTreeSet;

use crate::cli::RecurrenceArgs;

/// Parses a day given on the command line.
///
/// Exact `YYYY-MM-DD` dates are tried first; anything else goes through
/// natural language parsing relative to today ("tomorrow", "next friday").
pub fn parse_day(input: &str) -> Result<NaiveDate> {
    if let Ok(date) = parse_calendar_date(input) {
        return Ok(date);
    }
    parse_date_string(input, Local::now(), Dialect::Us)
        .map(|datetime| datetime.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

/// Parses `mon,wed,fri` (or numbers, 0 = Sunday) into weekday numbers.
pub fn parse_weekdays(input: &str) -> Result<BTreeSet<u8>> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| parse_weekday(part).map_err(anyhow::Error::from))
        .collect()
}

/// Builds the rule described by the recurrence flags; `None` without `--every`.
pub fn parse_recurrence(args: &RecurrenceArgs) -> Result<Option<RecurrenceRule>> {
    let Some(frequency) = args.every else {
        return Ok(None);
    };

    let interval = args.interval.unwrap_or(1);
    if interval == 0 {
        return Err(anyhow!(CoreError::InvalidInput(
            "--interval must be at least 1".to_string()
        )));
    }

    let mut rule = RecurrenceRule::new(frequency).every(interval);

    if let Some(on) = &args.on {
        if frequency != Frequency::Weekly {
            return Err(anyhow!(CoreError::InvalidInput(
                "--on can only be used with --every weekly".to_string()
            )));
        }
        rule = rule.on_weekdays(parse_weekdays(on)?);
    }
    if let Some(until) = &args.until {
        rule = rule.until(parse_day(until)?);
    }
    if let Some(count) = args.count {
        rule = rule.times(count);
    }

    Ok(Some(rule))
}
