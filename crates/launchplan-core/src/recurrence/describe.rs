//! Human-readable rendering of a recurrence pattern.

use super::{weekday_from_number, Frequency, RecurrencePattern, Termination};

fn weekday_list(pattern: &RecurrencePattern) -> Option<String> {
    if pattern.weekdays.is_empty() {
        return None;
    }
    let names: Vec<String> = pattern
        .weekdays
        .iter()
        .filter_map(|day| weekday_from_number(*day))
        .map(|weekday| weekday.to_string())
        .collect();
    Some(names.join("/"))
}

/// Describe a pattern, e.g. `Every Mon/Wed, ends after 12 occurrences`.
///
/// Output depends only on the pattern. Dates use ISO-8601 so the text does
/// not change with the user's locale.
pub fn describe(pattern: &RecurrencePattern) -> String {
    let cadence = match pattern.frequency {
        Frequency::Weekly => match weekday_list(pattern) {
            Some(days) => format!("Every {days}"),
            None => "Every week".to_string(),
        },
        Frequency::Biweekly => match weekday_list(pattern) {
            Some(days) => format!("Every other week on {days}"),
            None => "Every other week".to_string(),
        },
        Frequency::Monthly => match pattern.month_day {
            Some(day) => format!("Monthly on day {day}"),
            None => "Monthly".to_string(),
        },
        Frequency::Other => "Custom schedule".to_string(),
    };

    let ending = match pattern.termination {
        Termination::Never => "no end date".to_string(),
        Termination::OnDate { date } => format!("ends on {}", date.format("%Y-%m-%d")),
        Termination::AfterCount { count: 1 } => "ends after 1 occurrence".to_string(),
        Termination::AfterCount { count } => format!("ends after {count} occurrences"),
    };

    format!("{cadence}, {ending}")
}
