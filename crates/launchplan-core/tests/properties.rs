//! Property-based tests for the date planning invariants.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use launchplan_core::interval::add_days;
use launchplan_core::recurrence::MAX_OCCURRENCES;
use launchplan_core::{
    compute_suggested, detect_overlap, expand, suggest_adjustment, Cycle, DurationCategory,
    Frequency, Interval, RecurrencePattern, RiskWindow, Termination,
};
use proptest::prelude::*;

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (0i64..20_000).prop_map(|offset| add_days(base(), offset))
}

fn any_category() -> impl Strategy<Value = DurationCategory> {
    prop_oneof![
        Just(DurationCategory::Short),
        Just(DurationCategory::Standard),
        Just(DurationCategory::Extended),
    ]
}

fn any_weekdays() -> impl Strategy<Value = BTreeSet<u8>> {
    proptest::collection::btree_set(0u8..7, 0..7)
}

/// Property: suggested phases are contiguous and in order
#[test]
fn proptest_phases_are_contiguous() {
    proptest!(|(anchor in any_date(), category in any_category())| {
        let phases = compute_suggested(anchor, &category);
        prop_assert!(phases.is_ordered());
        prop_assert!(phases.runway.is_adjacent_to(&phases.pre_launch));
        prop_assert!(phases.pre_launch.is_adjacent_to(&phases.active_window));
        prop_assert!(phases.active_window.is_adjacent_to(&phases.post_window));
        prop_assert_eq!(phases.active_window.start, anchor);
    });
}

/// Property: computing twice gives the same phases, and re-anchoring a
/// phase set matches computing it fresh
#[test]
fn proptest_phases_are_deterministic() {
    proptest!(|(a in any_date(), b in any_date(), category in any_category())| {
        prop_assert_eq!(compute_suggested(a, &category), compute_suggested(a, &category));
        prop_assert_eq!(
            compute_suggested(a, &category).reanchored(b),
            compute_suggested(b, &category)
        );
    });
}

/// Property: AfterCount N yields exactly N ascending, distinct dates
#[test]
fn proptest_after_count_is_exact() {
    proptest!(|(
        first in any_date(),
        weekdays in any_weekdays(),
        biweekly in any::<bool>(),
        count in 1u32..=52
    )| {
        let termination = Termination::AfterCount { count };
        let pattern = if biweekly {
            RecurrencePattern::biweekly(weekdays, termination)
        } else {
            RecurrencePattern::weekly(weekdays, termination)
        };
        let expansion = expand(&pattern, first).unwrap();
        prop_assert_eq!(expansion.dates.len(), count as usize);
        prop_assert_eq!(expansion.dates[0], first);
        prop_assert!(expansion.dates.windows(2).all(|w| w[0] < w[1]));
        prop_assert!(!expansion.truncated);
    });
}

/// Property: counts above the cap are truncated to the cap
#[test]
fn proptest_large_counts_hit_cap() {
    proptest!(|(first in any_date(), day in 1u32..=31, count in 53u32..500)| {
        let pattern = RecurrencePattern::monthly(day, Termination::AfterCount { count });
        let expansion = expand(&pattern, first).unwrap();
        prop_assert_eq!(expansion.dates.len(), MAX_OCCURRENCES);
        prop_assert!(expansion.truncated);
    });
}

/// Property: no occurrence after the end date except the first
#[test]
fn proptest_on_date_is_respected() {
    proptest!(|(first in any_date(), span in 0i64..400, weekdays in any_weekdays())| {
        let until = add_days(first, span);
        let pattern = RecurrencePattern {
            frequency: Frequency::Weekly,
            weekdays,
            month_day: None,
            termination: Termination::OnDate { date: until },
        };
        let expansion = expand(&pattern, first).unwrap();
        prop_assert!(expansion.dates.iter().skip(1).all(|d| *d <= until));
    });
}

/// Property: overlap days equal the size of the intersection with the
/// absolute window
#[test]
fn proptest_overlap_matches_intersection() {
    proptest!(|(
        start in any_date(),
        len in 1i64..200,
        cycle_start in any_date(),
        offset_start in 1u32..=90,
        window_len in 0u32..30
    )| {
        let cycle = Cycle::new(cycle_start, 90).unwrap();
        let offset_end = (offset_start + window_len).min(90);
        let window = RiskWindow::new("low-energy", offset_start, offset_end);
        let interval = Interval::starting_at(start, len);

        let result = detect_overlap(&interval, Some(&cycle), &window).unwrap();
        let absolute = window.absolute(&cycle).unwrap();
        prop_assert_eq!(result.overlap_days, interval.overlap_days(&absolute));
        prop_assert_eq!(result.overlaps, result.overlap_days > 0);
    });
}

/// Property: a suggested anchor is outside the window and as close as
/// possible to the original
#[test]
fn proptest_adjustment_leaves_window() {
    proptest!(|(
        cycle_start in any_date(),
        offset_start in 1u32..=90,
        window_len in 0u32..30,
        pick in 0u32..30
    )| {
        let cycle = Cycle::new(cycle_start, 90).unwrap();
        let offset_end = (offset_start + window_len).min(90);
        let window = RiskWindow::new("low-energy", offset_start, offset_end);
        let absolute = window.absolute(&cycle).unwrap();
        let anchor = add_days(absolute.start, i64::from(pick) % absolute.len_days());

        let suggestion = suggest_adjustment(anchor, Some(&cycle), &window)
            .unwrap()
            .expect("anchor inside the window needs a suggestion");
        prop_assert!(!absolute.contains(suggestion.suggested_date));

        let to_earlier = (anchor - absolute.start).num_days() + 1;
        let to_later = (absolute.end - anchor).num_days() + 1;
        prop_assert_eq!(suggestion.shift_days.abs(), to_earlier.min(to_later));
    });
}
