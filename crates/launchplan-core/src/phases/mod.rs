//! Campaign phase timeline.
//!
//! A launch is laid out as four back-to-back phases around the day the
//! active window opens:
//!
//! ```text
//! | runway | pre-launch | active window | post window |
//!                       ^ anchor (open)  ^ close
//! ```
//!
//! Phase sets are derived values: recompute them whenever the anchor or
//! close date changes instead of editing one in place.

mod workload;

pub use workload::{estimate_workload, Intensity, PhaseLoad, WorkloadEstimate, WorkloadRates};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::interval::{add_days, days_between, Interval};

/// Coarse campaign length chosen by the user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DurationCategory {
    Short,
    Standard,
    Extended,
    /// Free-form length; the caller must ask for an explicit close date.
    Custom(String),
}

impl DurationCategory {
    /// Whether an explicit active-window close date is required.
    pub fn requires_close_date(&self) -> bool {
        matches!(self, Self::Custom(_))
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Short => "short",
            Self::Standard => "standard",
            Self::Extended => "extended",
            Self::Custom(text) => text,
        }
    }
}

impl std::str::FromStr for DurationCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "short" => Self::Short,
            "standard" => Self::Standard,
            "extended" => Self::Extended,
            _ => Self::Custom(s.trim().to_string()),
        })
    }
}

impl std::fmt::Display for DurationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// The four campaign phases, in timeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Runway,
    PreLaunch,
    ActiveWindow,
    PostWindow,
}

impl PhaseKind {
    pub const ALL: [PhaseKind; 4] = [
        PhaseKind::Runway,
        PhaseKind::PreLaunch,
        PhaseKind::ActiveWindow,
        PhaseKind::PostWindow,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Runway => "Runway",
            Self::PreLaunch => "Pre-Launch",
            Self::ActiveWindow => "Active Window",
            Self::PostWindow => "Post Window",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Default phase lengths for one duration category, in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseLengths {
    pub runway_days: u32,
    pub pre_launch_days: u32,
    /// Days from the open date to the close date.
    pub active_close_offset_days: u32,
    pub post_window_days: u32,
}

impl PhaseLengths {
    pub const fn new(runway: u32, pre_launch: u32, active_offset: u32, post_window: u32) -> Self {
        Self {
            runway_days: runway,
            pre_launch_days: pre_launch,
            active_close_offset_days: active_offset,
            post_window_days: post_window,
        }
    }

    pub(crate) fn validate(&self, key: &str) -> Result<(), ValidationError> {
        for (name, value) in [
            ("runway_days", self.runway_days),
            ("pre_launch_days", self.pre_launch_days),
            ("post_window_days", self.post_window_days),
        ] {
            if value == 0 {
                return Err(ValidationError::invalid_value(
                    &format!("{key}.{name}"),
                    "phase length must be at least one day",
                ));
            }
        }
        Ok(())
    }
}

/// Per-category default lengths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRules {
    #[serde(default = "default_short")]
    pub short: PhaseLengths,
    #[serde(default = "default_standard")]
    pub standard: PhaseLengths,
    #[serde(default = "default_extended")]
    pub extended: PhaseLengths,
}

fn default_short() -> PhaseLengths {
    PhaseLengths::new(14, 7, 3, 7)
}
fn default_standard() -> PhaseLengths {
    PhaseLengths::new(21, 10, 7, 7)
}
fn default_extended() -> PhaseLengths {
    PhaseLengths::new(28, 14, 14, 7)
}

impl Default for PhaseRules {
    fn default() -> Self {
        Self {
            short: default_short(),
            standard: default_standard(),
            extended: default_extended(),
        }
    }
}

impl PhaseRules {
    /// Lengths for a category; custom categories use the standard row.
    pub fn lengths_for(&self, category: &DurationCategory) -> &PhaseLengths {
        match category {
            DurationCategory::Short => &self.short,
            DurationCategory::Standard | DurationCategory::Custom(_) => &self.standard,
            DurationCategory::Extended => &self.extended,
        }
    }

    /// Suggested phases for an anchor (the active-window open date).
    pub fn compute_suggested(&self, anchor: NaiveDate, category: &DurationCategory) -> PhaseSet {
        let lengths = self.lengths_for(category);
        let close = add_days(anchor, i64::from(lengths.active_close_offset_days));
        let active = Interval {
            start: anchor,
            end: close,
        };
        PhaseSet::around(active, lengths)
    }

    /// Phases around a user-supplied open/close pair.
    ///
    /// Surrounding phases keep the category's default lengths.
    pub fn compute_with_close(
        &self,
        open: NaiveDate,
        close: NaiveDate,
        category: &DurationCategory,
    ) -> Result<PhaseSet, ValidationError> {
        let active = Interval::new(open, close)?;
        Ok(PhaseSet::around(active, self.lengths_for(category)))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.short.validate("phases.short")?;
        self.standard.validate("phases.standard")?;
        self.extended.validate("phases.extended")
    }
}

/// Suggested phases using the built-in default lengths.
pub fn compute_suggested(anchor: NaiveDate, category: &DurationCategory) -> PhaseSet {
    PhaseRules::default().compute_suggested(anchor, category)
}

/// Phases around an explicit open/close pair using default lengths.
pub fn compute_with_close(
    open: NaiveDate,
    close: NaiveDate,
    category: &DurationCategory,
) -> Result<PhaseSet, ValidationError> {
    PhaseRules::default().compute_with_close(open, close, category)
}

/// One phase and its closed date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub interval: Interval,
}

/// Four adjacent campaign phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSet {
    pub runway: Interval,
    pub pre_launch: Interval,
    pub active_window: Interval,
    pub post_window: Interval,
}

impl PhaseSet {
    fn around(active: Interval, lengths: &PhaseLengths) -> Self {
        let pre_launch = Interval::starting_at(
            add_days(active.start, -i64::from(lengths.pre_launch_days.max(1))),
            i64::from(lengths.pre_launch_days),
        );
        let runway = Interval::starting_at(
            add_days(pre_launch.start, -i64::from(lengths.runway_days.max(1))),
            i64::from(lengths.runway_days),
        );
        let post_window =
            Interval::starting_at(add_days(active.end, 1), i64::from(lengths.post_window_days));

        Self {
            runway,
            pre_launch,
            active_window: active,
            post_window,
        }
    }

    pub fn phase(&self, kind: PhaseKind) -> Interval {
        match kind {
            PhaseKind::Runway => self.runway,
            PhaseKind::PreLaunch => self.pre_launch,
            PhaseKind::ActiveWindow => self.active_window,
            PhaseKind::PostWindow => self.post_window,
        }
    }

    /// Phases in timeline order.
    pub fn iter(&self) -> impl Iterator<Item = Phase> + '_ {
        PhaseKind::ALL.into_iter().map(|kind| Phase {
            kind,
            interval: self.phase(kind),
        })
    }

    /// From the first runway day to the last post-window day.
    pub fn total_span(&self) -> Interval {
        Interval {
            start: self.runway.start,
            end: self.post_window.end,
        }
    }

    /// Every phase moved by the same number of days.
    pub fn shifted(&self, days: i64) -> PhaseSet {
        PhaseSet {
            runway: self.runway.shifted(days),
            pre_launch: self.pre_launch.shifted(days),
            active_window: self.active_window.shifted(days),
            post_window: self.post_window.shifted(days),
        }
    }

    /// Shift so the active window opens on `anchor`.
    pub fn reanchored(&self, anchor: NaiveDate) -> PhaseSet {
        self.shifted(days_between(self.active_window.start, anchor))
    }

    /// Each phase starts on or after the previous phase's end.
    pub fn is_ordered(&self) -> bool {
        let phases: Vec<Interval> = self.iter().map(|p| p.interval).collect();
        phases.iter().all(|p| p.start <= p.end)
            && phases.windows(2).all(|pair| pair[1].start >= pair[0].end)
    }
}
