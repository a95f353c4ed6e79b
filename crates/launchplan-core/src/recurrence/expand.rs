//! Occurrence expansion.

use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{Frequency, RecurrencePattern, Termination};
use crate::error::ValidationError;
use crate::interval::{add_days, clamp_month_day, days_between};

/// Hard upper bound on occurrences per expansion, first date included.
pub const MAX_OCCURRENCES: usize = 52;

/// Expanded occurrence dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expansion {
    /// Ascending, deduplicated; always starts with the first occurrence.
    pub dates: Vec<NaiveDate>,
    /// The cap stopped generation before the series ended on its own.
    pub truncated: bool,
}

/// Expand a pattern starting at `first`.
///
/// `first` is always the first entry. Expansion stops at the termination
/// rule or at [`MAX_OCCURRENCES`], whichever comes first.
///
/// # Errors
/// Returns a [`ValidationError`] for incomplete patterns; nothing is
/// generated in that case.
pub fn expand(pattern: &RecurrencePattern, first: NaiveDate) -> Result<Expansion, ValidationError> {
    pattern.validate()?;

    let mut dates = vec![first];
    let candidates: Box<dyn Iterator<Item = NaiveDate>> = match pattern.frequency {
        Frequency::Weekly => Box::new(weekly_candidates(first, &pattern.weekdays, 1)),
        Frequency::Biweekly => Box::new(weekly_candidates(first, &pattern.weekdays, 2)),
        Frequency::Monthly => {
            // validate() guarantees month_day for monthly patterns
            let day = pattern.month_day.unwrap_or_else(|| first.day());
            Box::new(monthly_candidates(first, day))
        }
        Frequency::Other => {
            return Ok(Expansion {
                dates,
                truncated: false,
            })
        }
    };

    let (limit, until) = match pattern.termination {
        Termination::Never => (MAX_OCCURRENCES, None),
        Termination::OnDate { date } => (MAX_OCCURRENCES, Some(date)),
        Termination::AfterCount { count } => ((count as usize).min(MAX_OCCURRENCES), None),
    };

    let mut truncated = false;
    for candidate in candidates {
        if until.is_some_and(|until| candidate > until) {
            break;
        }
        if dates.len() >= limit {
            truncated = match pattern.termination {
                Termination::AfterCount { count } => count as usize > MAX_OCCURRENCES,
                _ => true,
            };
            break;
        }
        dates.push(candidate);
    }

    if truncated {
        warn!(
            frequency = ?pattern.frequency,
            %first,
            cap = MAX_OCCURRENCES,
            "recurrence expansion truncated at cap"
        );
    } else {
        debug!(frequency = ?pattern.frequency, %first, count = dates.len(), "recurrence expanded");
    }

    Ok(Expansion { dates, truncated })
}

/// Days after `first` whose weekday is selected, keeping every
/// `week_interval`-th Sunday-start week counted from the week of `first`.
fn weekly_candidates(
    first: NaiveDate,
    weekdays: &BTreeSet<u8>,
    week_interval: i64,
) -> impl Iterator<Item = NaiveDate> {
    let first_weekday = first.weekday().num_days_from_sunday() as u8;
    let selected: BTreeSet<u8> = if weekdays.is_empty() {
        BTreeSet::from([first_weekday])
    } else {
        weekdays.clone()
    };
    let week_start = add_days(first, -i64::from(first_weekday));

    first.iter_days().skip(1).filter(move |day| {
        let week_index = days_between(week_start, *day) / 7;
        week_index % week_interval == 0
            && selected.contains(&(day.weekday().num_days_from_sunday() as u8))
    })
}

/// The `month_day`-th of each month after `first`, clamped to month end.
fn monthly_candidates(first: NaiveDate, month_day: u32) -> impl Iterator<Item = NaiveDate> {
    let base = i64::from(first.year()) * 12 + i64::from(first.month0());
    (1_i64..).map_while(move |offset| {
        let total = base + offset;
        let year = i32::try_from(total.div_euclid(12)).ok()?;
        let month = (total.rem_euclid(12) + 1) as u32;
        clamp_month_day(year, month, month_day)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_mon_wed_four_occurrences() {
        let pattern = RecurrencePattern::weekly([1, 3], Termination::AfterCount { count: 4 });
        let out = expand(&pattern, d(2024, 3, 4)).unwrap();
        assert_eq!(
            out.dates,
            vec![d(2024, 3, 4), d(2024, 3, 6), d(2024, 3, 11), d(2024, 3, 13)]
        );
        assert!(!out.truncated);
    }

    #[test]
    fn weekly_empty_set_uses_first_weekday() {
        let pattern = RecurrencePattern::weekly([], Termination::AfterCount { count: 3 });
        let out = expand(&pattern, d(2024, 3, 7)).unwrap();
        assert_eq!(out.dates, vec![d(2024, 3, 7), d(2024, 3, 14), d(2024, 3, 21)]);
    }

    #[test]
    fn first_date_is_kept_even_off_pattern() {
        // Saturday start, Mondays only
        let pattern = RecurrencePattern::weekly([1], Termination::AfterCount { count: 3 });
        let out = expand(&pattern, d(2024, 3, 9)).unwrap();
        assert_eq!(out.dates, vec![d(2024, 3, 9), d(2024, 3, 11), d(2024, 3, 18)]);
    }

    #[test]
    fn biweekly_skips_alternate_weeks() {
        let pattern = RecurrencePattern::biweekly([2, 4], Termination::AfterCount { count: 5 });
        // Tuesday 2024-03-05; week starts Sunday 2024-03-03
        let out = expand(&pattern, d(2024, 3, 5)).unwrap();
        assert_eq!(
            out.dates,
            vec![
                d(2024, 3, 5),
                d(2024, 3, 7),
                d(2024, 3, 19),
                d(2024, 3, 21),
                d(2024, 4, 2),
            ]
        );
    }

    #[test]
    fn monthly_clamps_to_last_day() {
        let pattern = RecurrencePattern::monthly(31, Termination::AfterCount { count: 4 });
        let out = expand(&pattern, d(2024, 1, 31)).unwrap();
        assert_eq!(
            out.dates,
            vec![d(2024, 1, 31), d(2024, 2, 29), d(2024, 3, 31), d(2024, 4, 30)]
        );
    }

    #[test]
    fn monthly_crosses_year_boundary() {
        let pattern = RecurrencePattern::monthly(15, Termination::AfterCount { count: 3 });
        let out = expand(&pattern, d(2024, 11, 15)).unwrap();
        assert_eq!(out.dates, vec![d(2024, 11, 15), d(2024, 12, 15), d(2025, 1, 15)]);
    }

    #[test]
    fn on_date_termination_is_inclusive() {
        let pattern = RecurrencePattern::weekly(
            [1],
            Termination::OnDate {
                date: d(2024, 3, 25),
            },
        );
        let out = expand(&pattern, d(2024, 3, 4)).unwrap();
        assert_eq!(out.dates.last(), Some(&d(2024, 3, 25)));
        assert_eq!(out.dates.len(), 4);
        assert!(!out.truncated);
    }

    #[test]
    fn end_date_before_first_yields_only_first() {
        let pattern = RecurrencePattern::weekly(
            [1],
            Termination::OnDate {
                date: d(2024, 1, 1),
            },
        );
        let out = expand(&pattern, d(2024, 3, 4)).unwrap();
        assert_eq!(out.dates, vec![d(2024, 3, 4)]);
    }

    #[test]
    fn never_terminated_stops_at_cap() {
        let pattern = RecurrencePattern::weekly([0, 1, 2, 3, 4, 5, 6], Termination::Never);
        let out = expand(&pattern, d(2024, 1, 1)).unwrap();
        assert_eq!(out.dates.len(), MAX_OCCURRENCES);
        assert!(out.truncated);
        assert_eq!(out.dates.last(), Some(&d(2024, 2, 21)));
    }

    #[test]
    fn large_count_is_capped_and_reported() {
        let pattern = RecurrencePattern::monthly(1, Termination::AfterCount { count: 60 });
        let out = expand(&pattern, d(2024, 1, 1)).unwrap();
        assert_eq!(out.dates.len(), MAX_OCCURRENCES);
        assert!(out.truncated);
    }

    #[test]
    fn count_equal_to_cap_is_not_truncated() {
        let pattern = RecurrencePattern::monthly(1, Termination::AfterCount { count: 52 });
        let out = expand(&pattern, d(2024, 1, 1)).unwrap();
        assert_eq!(out.dates.len(), MAX_OCCURRENCES);
        assert!(!out.truncated);
    }

    #[test]
    fn other_frequency_does_not_expand() {
        let pattern = RecurrencePattern {
            frequency: Frequency::Other,
            weekdays: BTreeSet::new(),
            month_day: None,
            termination: Termination::Never,
        };
        let out = expand(&pattern, d(2024, 3, 4)).unwrap();
        assert_eq!(out.dates, vec![d(2024, 3, 4)]);
        assert!(!out.truncated);
    }

    #[test]
    fn invalid_pattern_is_rejected_before_expansion() {
        let pattern = RecurrencePattern {
            frequency: Frequency::Monthly,
            weekdays: BTreeSet::new(),
            month_day: None,
            termination: Termination::Never,
        };
        assert!(expand(&pattern, d(2024, 3, 4)).is_err());
    }
}
