//! Calendar-day interval arithmetic.
//!
//! All intervals are closed: both `start` and `end` are part of the range.
//! Arithmetic is done in whole calendar days on [`NaiveDate`], never in
//! sub-day offsets, so leap days and month ends behave predictably.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;

/// Signed number of calendar days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Move a date by a signed number of calendar days.
///
/// Saturates at the representable date range.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    let magnitude = Days::new(days.unsigned_abs());
    let shifted = if days >= 0 {
        date.checked_add_days(magnitude)
    } else {
        date.checked_sub_days(magnitude)
    };
    shifted.unwrap_or(if days >= 0 {
        NaiveDate::MAX
    } else {
        NaiveDate::MIN
    })
}

/// Last valid day number of a month.
pub fn last_day_of_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|first| first.pred_opt())
        .map(|last| last.day())
        .unwrap_or(28)
}

/// The `day`-th day of a month, clamped to the month's last day.
pub fn clamp_month_day(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, last_day_of_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// A closed range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Interval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Interval {
    /// Create an interval, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ValidationError> {
        if start > end {
            return Err(ValidationError::InvalidInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// A one-day interval.
    pub fn single(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// Interval of `len_days` days beginning at `start`.
    ///
    /// Lengths below one are treated as one day.
    pub fn starting_at(start: NaiveDate, len_days: i64) -> Self {
        Self {
            start,
            end: add_days(start, len_days.max(1) - 1),
        }
    }

    /// Re-check the ordering invariant.
    ///
    /// Intervals built through [`Interval::new`] always pass; this guards
    /// values assembled field by field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.start > self.end {
            return Err(ValidationError::InvalidInterval {
                start: self.start,
                end: self.end,
            });
        }
        Ok(())
    }

    /// Inclusive length in days.
    pub fn len_days(&self) -> i64 {
        days_between(self.start, self.end) + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start <= other.end && self.end >= other.start
    }

    pub fn intersection(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }
        Some(Interval {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }

    /// Number of shared days, zero when disjoint.
    pub fn overlap_days(&self, other: &Interval) -> i64 {
        let shared = days_between(self.start.max(other.start), self.end.min(other.end)) + 1;
        shared.max(0)
    }

    /// Clamp a date into this interval.
    pub fn clamp(&self, day: NaiveDate) -> NaiveDate {
        day.clamp(self.start, self.end)
    }

    /// Same length, moved by a signed number of days.
    pub fn shifted(&self, days: i64) -> Interval {
        Interval {
            start: add_days(self.start, days),
            end: add_days(self.end, days),
        }
    }

    /// Iterate every day in the interval, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }

    /// Whether `next` begins exactly one day after this interval ends.
    pub fn is_adjacent_to(&self, next: &Interval) -> bool {
        days_between(self.end, next.start) == 1
    }
}

impl std::fmt::Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        struct Raw {
            start: NaiveDate,
            end: NaiveDate,
        }

        let raw = Raw::deserialize(deserializer)?;
        Interval::new(raw.start, raw.end).map_err(serde::de::Error::custom)
    }
}
