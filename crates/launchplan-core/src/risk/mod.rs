//! Low-energy window detection inside a repeating planning cycle.
//!
//! A [`Cycle`] is a fixed-length period identified by its start date. A
//! [`RiskWindow`] is a fixed sub-range of that cycle, in 1-indexed day
//! offsets. Only the current cycle instance is considered.
//!
//! Passing no cycle is valid and means no risk concept applies.

mod adjust;
mod advisory;

pub use adjust::{suggest_adjustment, AdjustmentSuggestion, ShiftDirection};
pub use advisory::{recommend_per_phase, AdvisoryLevel, PhaseAdvisory};

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ValidationError;
use crate::interval::{add_days, Interval};

/// A repeating planning period of fixed length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub start_date: NaiveDate,
    pub length_days: u32,
}

impl Cycle {
    pub fn new(start_date: NaiveDate, length_days: u32) -> Result<Self, ValidationError> {
        let cycle = Self {
            start_date,
            length_days,
        };
        cycle.validate()?;
        Ok(cycle)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.length_days == 0 {
            return Err(ValidationError::InvalidCycle {
                length_days: self.length_days,
            });
        }
        Ok(())
    }

    /// Absolute dates of the current cycle instance.
    pub fn span(&self) -> Interval {
        Interval::starting_at(self.start_date, i64::from(self.length_days))
    }
}

/// A fixed sub-range of a cycle, in 1-indexed day offsets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RiskWindow {
    pub id: String,
    pub offset_start_day: u32,
    pub offset_end_day: u32,
}

impl RiskWindow {
    pub fn new(id: impl Into<String>, offset_start_day: u32, offset_end_day: u32) -> Self {
        Self {
            id: id.into(),
            offset_start_day,
            offset_end_day,
        }
    }

    /// Check `0 < start <= end <= cycle.length_days`.
    pub fn validate(&self, cycle: &Cycle) -> Result<(), ValidationError> {
        cycle.validate()?;
        if self.offset_start_day == 0
            || self.offset_start_day > self.offset_end_day
            || self.offset_end_day > cycle.length_days
        {
            return Err(ValidationError::InvalidRiskWindow {
                id: self.id.clone(),
                offset_start_day: self.offset_start_day,
                offset_end_day: self.offset_end_day,
                cycle_length: cycle.length_days,
            });
        }
        Ok(())
    }

    /// Total length of the window in days.
    pub fn len_days(&self) -> i64 {
        i64::from(self.offset_end_day) - i64::from(self.offset_start_day) + 1
    }

    /// Absolute dates of this window in the given cycle instance.
    pub fn absolute(&self, cycle: &Cycle) -> Result<Interval, ValidationError> {
        self.validate(cycle)?;
        Interval::new(
            add_days(cycle.start_date, i64::from(self.offset_start_day) - 1),
            add_days(cycle.start_date, i64::from(self.offset_end_day) - 1),
        )
    }
}

/// How much of a risk window an interval covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    None,
    Partial,
    Full,
}

impl Severity {
    /// `Full` once the overlap reaches half the window.
    pub fn classify(overlap_days: i64, window_days: i64) -> Self {
        if overlap_days <= 0 {
            Severity::None
        } else if overlap_days * 2 >= window_days {
            Severity::Full
        } else {
            Severity::Partial
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapResult {
    pub overlaps: bool,
    pub overlap_days: i64,
    pub severity: Severity,
    pub affected_sub_windows: BTreeSet<String>,
}

impl OverlapResult {
    pub fn none() -> Self {
        Self {
            overlaps: false,
            overlap_days: 0,
            severity: Severity::None,
            affected_sub_windows: BTreeSet::new(),
        }
    }
}

/// Check an interval against the current cycle's risk window.
///
/// # Errors
/// Returns a [`ValidationError`] when the interval is reversed or the
/// window offsets do not fit inside the cycle.
pub fn detect_overlap(
    interval: &Interval,
    cycle: Option<&Cycle>,
    window: &RiskWindow,
) -> Result<OverlapResult, ValidationError> {
    interval.validate()?;
    let Some(cycle) = cycle else {
        return Ok(OverlapResult::none());
    };

    let absolute = window.absolute(cycle)?;
    let overlap_days = interval.overlap_days(&absolute);
    if overlap_days == 0 {
        return Ok(OverlapResult::none());
    }

    let severity = Severity::classify(overlap_days, window.len_days());
    debug!(
        window = %window.id,
        %interval,
        overlap_days,
        ?severity,
        "interval overlaps risk window"
    );

    Ok(OverlapResult {
        overlaps: true,
        overlap_days,
        severity,
        affected_sub_windows: BTreeSet::from([window.id.clone()]),
    })
}

/// Check an interval against several sub-windows of the same cycle.
///
/// Overlap days are summed, severity is the worst seen, and every
/// overlapping window id is reported.
pub fn detect_overlap_any(
    interval: &Interval,
    cycle: Option<&Cycle>,
    windows: &[RiskWindow],
) -> Result<OverlapResult, ValidationError> {
    let mut combined = OverlapResult::none();
    for window in windows {
        let result = detect_overlap(interval, cycle, window)?;
        combined.overlaps |= result.overlaps;
        combined.overlap_days += result.overlap_days;
        combined.severity = combined.severity.max(result.severity);
        combined.affected_sub_windows.extend(result.affected_sub_windows);
    }
    Ok(combined)
}
