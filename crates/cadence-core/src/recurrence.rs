use chrono::{Days, Months, NaiveDate};
use uuid::Uuid;

use crate::calendar::{self, weekday_number, ViewWindow};
use crate::error::CoreError;
use crate::models::{Frequency, RecurrenceEnd, RecurrenceRule, Task};

/// RecurrenceExpander: turns one rule anchored at one date into a bounded,
/// ordered sequence of occurrence dates.
///
/// Stepping rules:
/// - daily: `anchor + k * interval` days
/// - weekly without weekdays: `anchor + k * interval` weeks
/// - weekly with weekdays: every listed weekday of every `interval`-th
///   Sunday-started week, starting with the anchor's own week; the anchor
///   itself is always the first occurrence
/// - monthly / yearly: `anchor + k * interval` months (years), clamped to the
///   last day of a shorter month. Each step is taken from the anchor, so a
///   series anchored on the 31st returns to the 31st after a short month.
#[derive(Debug, Clone, Copy)]
pub struct RecurrenceExpander<'a> {
    anchor: NaiveDate,
    rule: &'a RecurrenceRule,
}

impl<'a> RecurrenceExpander<'a> {
    pub fn new(anchor: NaiveDate, rule: &'a RecurrenceRule) -> Self {
        Self { anchor, rule }
    }

    /// Expander for the anchor task of an active series, `None` for anything else.
    pub fn for_task(task: &'a Task) -> Option<Self> {
        task.active_recurrence().map(|rule| Self::new(task.date, rule))
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn rule(&self) -> &RecurrenceRule {
        self.rule
    }

    /// Every occurrence of the series in ascending order, honoring the rule's
    /// end date or count but not any span limit. Unbounded rules yield
    /// until the calendar runs out, so callers must bound the iteration
    /// themselves.
    pub fn occurrences(&self) -> impl Iterator<Item = NaiveDate> + 'a {
        let until = self.rule.end_date();
        let limit = match self.rule.end {
            RecurrenceEnd::Count(count) => usize::try_from(count.get()).unwrap_or(usize::MAX),
            _ => usize::MAX,
        };
        let cursor = if self.rule.is_active() {
            Cursor::new(self.anchor, self.rule)
        } else {
            Cursor::Single(Some(self.anchor))
        };

        cursor
            .take_while(move |date| until.map_or(true, |until| *date <= until))
            .take(limit)
    }

    /// Occurrences no later than `anchor + max_span_days`.
    ///
    /// A non-repeating rule always yields exactly the anchor.
    pub fn generate_occurrence_dates(&self, max_span_days: u32) -> Vec<NaiveDate> {
        if !self.rule.is_active() {
            return vec![self.anchor];
        }

        let horizon = self
            .anchor
            .checked_add_days(Days::new(u64::from(max_span_days)))
            .unwrap_or(NaiveDate::MAX);

        self.occurrences().take_while(|date| *date <= horizon).collect()
    }

    /// The next `count` occurrences falling on or after `from`.
    pub fn preview(&self, from: NaiveDate, count: usize) -> Vec<NaiveDate> {
        self.occurrences()
            .skip_while(|date| *date < from)
            .take(count)
            .collect()
    }
}

/// Candidate dates for an active rule, ascending and unbounded.
enum Cursor {
    Single(Option<NaiveDate>),
    Stepped {
        anchor: NaiveDate,
        frequency: Frequency,
        interval: u32,
        step: u32,
    },
    Weekdays {
        anchor: NaiveDate,
        anchor_emitted: bool,
        week_start: NaiveDate,
        days: Vec<u8>,
        next: usize,
        interval: u32,
    },
}

impl Cursor {
    fn new(anchor: NaiveDate, rule: &RecurrenceRule) -> Self {
        let interval = rule.effective_interval();

        if rule.frequency == Frequency::Weekly && !rule.weekdays.is_empty() {
            let offset = u64::from(weekday_number(anchor));
            match anchor.checked_sub_days(Days::new(offset)) {
                Some(week_start) => {
                    return Cursor::Weekdays {
                        anchor,
                        anchor_emitted: false,
                        week_start,
                        days: rule.weekdays.iter().copied().collect(),
                        next: 0,
                        interval,
                    }
                }
                None => return Cursor::Single(Some(anchor)),
            }
        }

        Cursor::Stepped {
            anchor,
            frequency: rule.frequency,
            interval,
            step: 0,
        }
    }
}

impl Iterator for Cursor {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        match self {
            Cursor::Single(date) => date.take(),
            Cursor::Stepped {
                anchor,
                frequency,
                interval,
                step,
            } => {
                let offset = step.checked_mul(*interval)?;
                *step = step.checked_add(1)?;
                match frequency {
                    Frequency::None => (offset == 0).then_some(*anchor),
                    Frequency::Daily => anchor.checked_add_days(Days::new(u64::from(offset))),
                    Frequency::Weekly => {
                        anchor.checked_add_days(Days::new(u64::from(offset) * 7))
                    }
                    Frequency::Monthly => anchor.checked_add_months(Months::new(offset)),
                    Frequency::Yearly => {
                        anchor.checked_add_months(Months::new(offset.checked_mul(12)?))
                    }
                }
            }
            Cursor::Weekdays {
                anchor,
                anchor_emitted,
                week_start,
                days,
                next,
                interval,
            } => {
                if !*anchor_emitted {
                    *anchor_emitted = true;
                    return Some(*anchor);
                }
                loop {
                    if *next >= days.len() {
                        *week_start =
                            week_start.checked_add_days(Days::new(u64::from(*interval) * 7))?;
                        *next = 0;
                    }
                    let day = days[*next];
                    *next += 1;
                    let candidate = week_start.checked_add_days(Days::new(u64::from(day)))?;
                    if candidate > *anchor {
                        return Some(candidate);
                    }
                }
            }
        }
    }
}

/// Occurrence dates of `rule` anchored at `anchor`, no later than
/// `anchor + max_span_days`.
pub fn generate_occurrence_dates(
    anchor: NaiveDate,
    rule: &RecurrenceRule,
    max_span_days: u32,
) -> Vec<NaiveDate> {
    RecurrenceExpander::new(anchor, rule).generate_occurrence_dates(max_span_days)
}

/// String-facing form of [`generate_occurrence_dates`].
///
/// An unparseable anchor fails closed: no dates, `CoreError::InvalidDate`.
pub fn generate_occurrence_date_strings(
    anchor: &str,
    rule: &RecurrenceRule,
    max_span_days: u32,
) -> Result<Vec<String>, CoreError> {
    let anchor = calendar::parse_calendar_date(anchor)?;
    Ok(generate_occurrence_dates(anchor, rule, max_span_days)
        .into_iter()
        .map(calendar::format_calendar_date)
        .collect())
}

/// Deterministic id for the virtual instance of `parent_id` on `date`.
///
/// Name-based (v5) ids never collide with the random (v4) ids given to
/// persisted tasks.
pub fn synthetic_instance_id(parent_id: Uuid, date: NaiveDate) -> Uuid {
    Uuid::new_v5(&parent_id, calendar::format_calendar_date(date).as_bytes())
}

/// Builds display-ready instances of `parent` for each of `dates`.
///
/// Instances copy the parent's content and audit timestamps, start out
/// incomplete and never carry the recurrence rule themselves.
pub fn materialize_instances(parent: &Task, dates: &[NaiveDate]) -> Vec<Task> {
    dates
        .iter()
        .map(|date| Task {
            id: synthetic_instance_id(parent.id, *date),
            title: parent.title.clone(),
            description: parent.description.clone(),
            date: *date,
            order: parent.order,
            priority: parent.priority,
            completed: false,
            created_at: parent.created_at,
            updated_at: parent.updated_at,
            recurrence: None,
            parent_task_id: Some(parent.id),
            is_recurring: true,
        })
        .collect()
}

/// Whether `task` is the anchor of an active series that can reach `window`.
pub fn should_expand(task: &Task, window: &ViewWindow) -> bool {
    let Some(rule) = task.active_recurrence() else {
        return false;
    };
    if task.date > window.end {
        return false;
    }
    rule.end_date().map_or(true, |until| until >= window.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskPriority;
    use chrono::Datelike;
    use proptest::prelude::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dates(list: &[(i32, u32, u32)]) -> Vec<NaiveDate> {
        list.iter().map(|(y, m, d)| date(*y, *m, *d)).collect()
    }

    mod generation_tests {
        use super::*;

        #[test]
        fn test_none_rule_returns_anchor_only() {
            let rule = RecurrenceRule::none().times(10);
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 365);
            assert_eq!(result, vec![date(2024, 1, 1)]);
        }

        #[test]
        fn test_daily_with_interval() {
            let rule = RecurrenceRule::daily().every(3);
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 10);
            assert_eq!(
                result,
                dates(&[(2024, 1, 1), (2024, 1, 4), (2024, 1, 7), (2024, 1, 10)])
            );
        }

        #[test]
        fn test_zero_interval_behaves_as_one() {
            let rule = RecurrenceRule::daily().every(0);
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 2);
            assert_eq!(result, dates(&[(2024, 1, 1), (2024, 1, 2), (2024, 1, 3)]));
        }

        #[test]
        fn test_count_includes_anchor() {
            let rule = RecurrenceRule::daily().times(4);
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 365);
            assert_eq!(result.len(), 4);
            assert_eq!(result[0], date(2024, 1, 1));
            assert_eq!(result[3], date(2024, 1, 4));
        }

        #[test]
        fn test_count_limited_by_span() {
            let rule = RecurrenceRule::weekly().times(50);
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 21);
            assert_eq!(result.len(), 4);
        }

        #[test]
        fn test_end_date_is_inclusive() {
            let rule = RecurrenceRule::daily().every(2).until(date(2024, 1, 5));
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 365);
            assert_eq!(result, dates(&[(2024, 1, 1), (2024, 1, 3), (2024, 1, 5)]));

            let rule = RecurrenceRule::daily().every(2).until(date(2024, 1, 6));
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 365);
            assert_eq!(result.last(), Some(&date(2024, 1, 5)));
        }

        #[test]
        fn test_end_date_before_anchor_yields_nothing() {
            let rule = RecurrenceRule::daily().until(date(2023, 12, 31));
            assert!(generate_occurrence_dates(date(2024, 1, 1), &rule, 30).is_empty());
        }

        #[test]
        fn test_weekly_without_weekdays_uses_anchor_weekday() {
            // 2024-01-03 is a Wednesday
            let rule = RecurrenceRule::weekly().every(2);
            let result = generate_occurrence_dates(date(2024, 1, 3), &rule, 42);
            assert_eq!(
                result,
                dates(&[(2024, 1, 3), (2024, 1, 17), (2024, 1, 31), (2024, 2, 14)])
            );
        }

        #[test]
        fn test_weekly_mon_wed_fri() {
            let rule = RecurrenceRule::weekly().on_weekdays([1, 3, 5]).times(6);
            let result = generate_occurrence_dates(date(2024, 1, 1), &rule, 365);
            assert_eq!(
                result,
                dates(&[
                    (2024, 1, 1),
                    (2024, 1, 3),
                    (2024, 1, 5),
                    (2024, 1, 8),
                    (2024, 1, 10),
                    (2024, 1, 12),
                ])
            );
            let weekdays: Vec<u8> = result.iter().map(|d| weekday_number(*d)).collect();
            assert_eq!(weekdays, vec![1, 3, 5, 1, 3, 5]);
        }

        #[test]
        fn test_every_other_monday() {
            let rule = RecurrenceRule::weekly().every(2).on_weekdays([1]);
            let window_end = date(2024, 2, 29);
            let result: Vec<NaiveDate> = generate_occurrence_dates(date(2024, 1, 1), &rule, 89)
                .into_iter()
                .filter(|d| *d <= window_end)
                .collect();
            assert_eq!(
                result,
                dates(&[
                    (2024, 1, 1),
                    (2024, 1, 15),
                    (2024, 1, 29),
                    (2024, 2, 12),
                    (2024, 2, 26),
                ])
            );
        }

        #[test]
        fn test_weekly_weekdays_skip_days_before_anchor() {
            // Anchor on Thursday 2024-01-04; Tuesday of that week is already past
            let rule = RecurrenceRule::weekly().on_weekdays([2, 4]);
            let result = generate_occurrence_dates(date(2024, 1, 4), &rule, 7);
            assert_eq!(result, dates(&[(2024, 1, 4), (2024, 1, 9), (2024, 1, 11)]));
        }

        #[test]
        fn test_weekly_anchor_outside_weekday_set_counts_as_first() {
            // Anchor on Tuesday, rule fires on Fridays
            let rule = RecurrenceRule::weekly().on_weekdays([5]).times(3);
            let result = generate_occurrence_dates(date(2024, 1, 2), &rule, 365);
            assert_eq!(result, dates(&[(2024, 1, 2), (2024, 1, 5), (2024, 1, 12)]));
        }

        #[rstest]
        #[case(date(2024, 1, 31), vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31), date(2024, 4, 30)])]
        #[case(date(2023, 1, 31), vec![date(2023, 1, 31), date(2023, 2, 28), date(2023, 3, 31), date(2023, 4, 30)])]
        #[case(date(2024, 1, 15), vec![date(2024, 1, 15), date(2024, 2, 15), date(2024, 3, 15), date(2024, 4, 15)])]
        fn test_monthly_clamps_to_last_day(#[case] anchor: NaiveDate, #[case] expected: Vec<NaiveDate>) {
            let rule = RecurrenceRule::monthly().times(4);
            assert_eq!(generate_occurrence_dates(anchor, &rule, 400), expected);
            // Same answer on every call
            assert_eq!(generate_occurrence_dates(anchor, &rule, 400), expected);
        }

        #[test]
        fn test_monthly_with_interval() {
            let rule = RecurrenceRule::monthly().every(5).times(3);
            let result = generate_occurrence_dates(date(2024, 10, 31), &rule, 400);
            assert_eq!(result, dates(&[(2024, 10, 31), (2025, 3, 31), (2025, 8, 31)]));
        }

        #[test]
        fn test_yearly_from_leap_day() {
            let rule = RecurrenceRule::yearly().times(5);
            let result = generate_occurrence_dates(date(2024, 2, 29), &rule, 3000);
            assert_eq!(
                result,
                dates(&[
                    (2024, 2, 29),
                    (2025, 2, 28),
                    (2026, 2, 28),
                    (2027, 2, 28),
                    (2028, 2, 29),
                ])
            );
        }

        #[test]
        fn test_string_wrapper_fails_closed() {
            let rule = RecurrenceRule::daily();
            let result = generate_occurrence_date_strings("01/02/2024", &rule, 5);
            assert!(matches!(result, Err(CoreError::InvalidDate(_))));

            let result = generate_occurrence_date_strings("2024-01-01", &rule, 2).unwrap();
            assert_eq!(result, vec!["2024-01-01", "2024-01-02", "2024-01-03"]);
        }

        #[test]
        fn test_preview_starts_at_from() {
            let rule = RecurrenceRule::weekly();
            let expander = RecurrenceExpander::new(date(2024, 1, 1), &rule);
            let result = expander.preview(date(2024, 3, 1), 3);
            assert_eq!(result, dates(&[(2024, 3, 4), (2024, 3, 11), (2024, 3, 18)]));
        }

        #[test]
        fn test_preview_respects_count() {
            let rule = RecurrenceRule::daily().times(3);
            let expander = RecurrenceExpander::new(date(2024, 1, 1), &rule);
            assert_eq!(expander.preview(date(2024, 1, 2), 10).len(), 2);
        }

        #[test]
        fn test_generation_stops_at_calendar_edge() {
            let rule = RecurrenceRule::yearly();
            let result = generate_occurrence_dates(NaiveDate::MAX, &rule, u32::MAX);
            assert_eq!(result, vec![NaiveDate::MAX]);
        }
    }

    mod materialize_tests {
        use super::*;

        fn parent() -> Task {
            Task {
                title: "Standup".to_string(),
                description: Some("Daily sync".to_string()),
                date: date(2024, 1, 1),
                order: 3,
                priority: TaskPriority::High,
                completed: true,
                recurrence: Some(RecurrenceRule::daily()),
                ..Default::default()
            }
        }

        #[test]
        fn test_instances_copy_parent_fields() {
            let parent = parent();
            let days = dates(&[(2024, 1, 2), (2024, 1, 3)]);
            let instances = materialize_instances(&parent, &days);

            assert_eq!(instances.len(), 2);
            for (instance, day) in instances.iter().zip(&days) {
                assert_eq!(instance.date, *day);
                assert_eq!(instance.title, parent.title);
                assert_eq!(instance.description, parent.description);
                assert_eq!(instance.order, parent.order);
                assert_eq!(instance.priority, parent.priority);
                assert_eq!(instance.created_at, parent.created_at);
                assert_eq!(instance.updated_at, parent.updated_at);
                assert_eq!(instance.parent_task_id, Some(parent.id));
                assert!(instance.recurrence.is_none());
                assert!(instance.is_recurring);
                assert!(!instance.completed);
                assert_ne!(instance.id, parent.id);
            }
            assert_ne!(instances[0].id, instances[1].id);
        }

        #[test]
        fn test_synthetic_ids_are_deterministic() {
            let parent = parent();
            let days = dates(&[(2024, 1, 2)]);
            let first = materialize_instances(&parent, &days);
            let second = materialize_instances(&parent, &days);
            assert_eq!(first, second);
            assert_eq!(first[0].id, synthetic_instance_id(parent.id, date(2024, 1, 2)));
            assert_eq!(first[0].id.get_version_num(), 5);
        }
    }

    mod should_expand_tests {
        use super::*;

        fn window() -> ViewWindow {
            ViewWindow::new(date(2024, 2, 1), date(2024, 2, 29)).unwrap()
        }

        #[test]
        fn test_parent_before_window_expands() {
            let task = Task {
                date: date(2023, 6, 1),
                recurrence: Some(RecurrenceRule::weekly()),
                ..Default::default()
            };
            assert!(should_expand(&task, &window()));
        }

        #[test]
        fn test_parent_after_window_does_not_expand() {
            let task = Task {
                date: date(2024, 3, 1),
                recurrence: Some(RecurrenceRule::daily()),
                ..Default::default()
            };
            assert!(!should_expand(&task, &window()));
        }

        #[test]
        fn test_series_ended_before_window_does_not_expand() {
            let task = Task {
                date: date(2024, 1, 1),
                recurrence: Some(RecurrenceRule::daily().until(date(2024, 1, 31))),
                ..Default::default()
            };
            assert!(!should_expand(&task, &window()));
        }

        #[test]
        fn test_instances_and_plain_tasks_do_not_expand() {
            let plain = Task {
                date: date(2024, 2, 2),
                ..Default::default()
            };
            let instance = Task {
                date: date(2024, 2, 2),
                parent_task_id: Some(Uuid::new_v4()),
                recurrence: Some(RecurrenceRule::daily()),
                ..Default::default()
            };
            assert!(!should_expand(&plain, &window()));
            assert!(!should_expand(&instance, &window()));
        }
    }

    fn arb_rule() -> impl Strategy<Value = RecurrenceRule> {
        (
            prop_oneof![
                Just(Frequency::Daily),
                Just(Frequency::Weekly),
                Just(Frequency::Monthly),
                Just(Frequency::Yearly),
            ],
            0u32..5,
            prop::collection::btree_set(0u8..7, 0..4),
            prop::option::of(1u32..40),
        )
            .prop_map(|(frequency, interval, weekdays, count)| {
                let rule = RecurrenceRule::new(frequency).every(interval).on_weekdays(weekdays);
                match count {
                    Some(count) => rule.times(count),
                    None => rule,
                }
            })
    }

    proptest! {
        #[test]
        fn prop_occurrences_are_ascending_and_bounded(
            rule in arb_rule(),
            offset in 0i64..3000,
            span in 1u32..800,
        ) {
            let anchor = date(2020, 1, 1) + chrono::Duration::days(offset);
            let result = generate_occurrence_dates(anchor, &rule, span);

            prop_assert_eq!(result.first(), Some(&anchor));
            prop_assert!(result.windows(2).all(|pair| pair[0] < pair[1]));
            prop_assert!(result.iter().all(|d| (*d - anchor).num_days() <= i64::from(span)));
            if let Some(count) = rule.count() {
                let unbounded = RecurrenceRule { end: RecurrenceEnd::Unbounded, ..rule.clone() };
                let mut expected = generate_occurrence_dates(anchor, &unbounded, span);
                expected.truncate(count as usize);
                prop_assert_eq!(result, expected);
            }
        }

        #[test]
        fn prop_weekly_occurrences_fall_on_listed_weekdays(
            weekdays in prop::collection::btree_set(0u8..7, 1..7),
            offset in 0i64..400,
        ) {
            let anchor = date(2024, 1, 1) + chrono::Duration::days(offset);
            let rule = RecurrenceRule::weekly().on_weekdays(weekdays.clone());
            let result = generate_occurrence_dates(anchor, &rule, 60);

            for day in result.iter().skip(1) {
                prop_assert!(weekdays.contains(&(day.weekday().num_days_from_sunday() as u8)));
            }
        }
    }
}
