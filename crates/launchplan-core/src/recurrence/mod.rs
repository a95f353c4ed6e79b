//! Recurrence rules for editorial series.
//!
//! A [`RecurrencePattern`] is authored once per series. Occurrence lists
//! are computed on demand with [`expand`]; only the items created from
//! them are persisted.

mod describe;
mod expand;

pub use describe::describe;
pub use expand::{expand, Expansion, MAX_OCCURRENCES};

use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    /// No automatic expansion.
    Other,
}

impl std::str::FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "other" => Ok(Self::Other),
            other => Err(ValidationError::invalid_value(
                "frequency",
                format!("unknown frequency '{other}'"),
            )),
        }
    }
}

/// When a series stops producing occurrences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Termination {
    Never,
    OnDate { date: NaiveDate },
    AfterCount { count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrencePattern {
    pub frequency: Frequency,
    /// 0 = Sunday .. 6 = Saturday; used by weekly and biweekly.
    #[serde(default)]
    pub weekdays: BTreeSet<u8>,
    /// 1..=31; required for monthly.
    #[serde(default)]
    pub month_day: Option<u32>,
    pub termination: Termination,
}

impl RecurrencePattern {
    pub fn weekly(weekdays: impl IntoIterator<Item = u8>, termination: Termination) -> Self {
        Self {
            frequency: Frequency::Weekly,
            weekdays: weekdays.into_iter().collect(),
            month_day: None,
            termination,
        }
    }

    pub fn biweekly(weekdays: impl IntoIterator<Item = u8>, termination: Termination) -> Self {
        Self {
            frequency: Frequency::Biweekly,
            ..Self::weekly(weekdays, termination)
        }
    }

    pub fn monthly(month_day: u32, termination: Termination) -> Self {
        Self {
            frequency: Frequency::Monthly,
            weekdays: BTreeSet::new(),
            month_day: Some(month_day),
            termination,
        }
    }

    /// Reject incomplete or out-of-range patterns before expansion.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(bad) = self.weekdays.iter().find(|day| **day > 6) {
            return Err(ValidationError::invalid_value(
                "weekdays",
                format!("weekday {bad} is outside 0 (Sunday) ..= 6 (Saturday)"),
            ));
        }

        match (self.frequency, self.month_day) {
            (Frequency::Monthly, None) => {
                return Err(ValidationError::invalid_value(
                    "month_day",
                    "a monthly pattern needs a day of the month",
                ));
            }
            (_, Some(day)) if !(1..=31).contains(&day) => {
                return Err(ValidationError::invalid_value(
                    "month_day",
                    format!("day {day} is outside 1..=31"),
                ));
            }
            _ => {}
        }

        if let Termination::AfterCount { count: 0 } = self.termination {
            return Err(ValidationError::invalid_value(
                "occurrence_count",
                "a series must have at least one occurrence",
            ));
        }
        Ok(())
    }
}

/// Map a 0 = Sunday weekday number to chrono's [`Weekday`].
pub fn weekday_from_number(day: u8) -> Option<Weekday> {
    match day {
        0 => Some(Weekday::Sun),
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        _ => None,
    }
}

/// Parse a comma-separated weekday list such as `1,3` or `mon,wed`.
pub fn parse_weekdays(input: &str) -> Result<BTreeSet<u8>, ValidationError> {
    input
        .split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            if let Ok(number) = part.parse::<u8>() {
                return Ok(number);
            }
            part.parse::<Weekday>()
                .map(|w| w.num_days_from_sunday() as u8)
                .map_err(|_| {
                    ValidationError::invalid_value("weekdays", format!("unknown weekday '{part}'"))
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_without_day_is_rejected() {
        let pattern = RecurrencePattern {
            frequency: Frequency::Monthly,
            weekdays: BTreeSet::new(),
            month_day: None,
            termination: Termination::Never,
        };
        assert_eq!(pattern.validate().unwrap_err().field(), "month_day");
    }

    #[test]
    fn weekday_out_of_range_is_rejected() {
        let pattern = RecurrencePattern::weekly([1, 7], Termination::Never);
        assert_eq!(pattern.validate().unwrap_err().field(), "weekdays");
    }

    #[test]
    fn zero_count_is_rejected() {
        let pattern = RecurrencePattern::weekly([1], Termination::AfterCount { count: 0 });
        assert_eq!(pattern.validate().unwrap_err().field(), "occurrence_count");
    }

    #[test]
    fn empty_weekly_set_is_valid() {
        let pattern = RecurrencePattern::weekly([], Termination::Never);
        assert!(pattern.validate().is_ok());
    }

    #[test]
    fn parse_weekdays_accepts_numbers_and_names() {
        let days = parse_weekdays("mon, 3,Fri").unwrap();
        assert_eq!(days.into_iter().collect::<Vec<_>>(), vec![1, 3, 5]);
        assert!(parse_weekdays("funday").is_err());
    }

    #[test]
    fn termination_serializes_with_mode_tag() {
        let json = serde_json::to_value(Termination::AfterCount { count: 12 }).unwrap();
        assert_eq!(json, serde_json::json!({"mode": "after_count", "count": 12}));
    }
}
