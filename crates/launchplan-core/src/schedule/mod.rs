//! Calendar placement of content items.
//!
//! Each content entity can be placed independently in two lanes: the day
//! the work is produced ([`Lane::Creation`]) and the day it goes live
//! ([`Lane::Publication`]). A placement with no date sits in the lane's
//! unscheduled pool.
//!
//! All placement changes go through [`ScheduleCoordinator`]; calendar
//! views never edit dates directly.

mod coordinator;
pub mod drag;
mod store;

pub use coordinator::{
    BulkGeneration, GenerationFailure, PendingIntent, RetryOutcome, ScheduleCoordinator,
};
pub use drag::{DragGesture, DropTarget};
pub use store::{InMemoryStore, PlacementStore};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::interval::{add_days, days_between};

/// Semantic axis of a placement, orthogonal to the date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Lane {
    Creation,
    Publication,
}

impl Lane {
    pub const ALL: [Lane; 2] = [Lane::Creation, Lane::Publication];

    pub fn as_str(&self) -> &'static str {
        match self {
            Lane::Creation => "creation",
            Lane::Publication => "publication",
        }
    }
}

impl std::fmt::Display for Lane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Lane {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "creation" | "create" => Ok(Lane::Creation),
            "publication" | "publish" => Ok(Lane::Publication),
            other => Err(crate::error::ValidationError::invalid_value(
                "lane",
                format!("unknown lane '{other}' (expected creation or publication)"),
            )),
        }
    }
}

/// Placement state of one item in one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "date", rename_all = "snake_case")]
pub enum PlacementState {
    Unscheduled,
    Scheduled(NaiveDate),
}

/// One lane placement of a content entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledItem {
    pub item_id: String,
    pub lane: Lane,
    /// `None` means the item is in the unscheduled pool.
    pub date: Option<NaiveDate>,
    /// Recurring series this item was generated from.
    #[serde(default)]
    pub series_id: Option<String>,
}

impl ScheduledItem {
    pub fn new(item_id: impl Into<String>, lane: Lane, date: Option<NaiveDate>) -> Self {
        Self {
            item_id: item_id.into(),
            lane,
            date,
            series_id: None,
        }
    }

    pub fn with_series(mut self, series_id: impl Into<String>) -> Self {
        self.series_id = Some(series_id.into());
        self
    }

    pub fn state(&self) -> PlacementState {
        match self.date {
            Some(date) => PlacementState::Scheduled(date),
            None => PlacementState::Unscheduled,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.date.is_some()
    }
}

/// Template for items generated from a recurring series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesTemplate {
    /// The parent item that owns the series.
    pub series_id: String,
    /// Lane that receives the occurrence dates.
    pub lane: Lane,
    /// Days between creation and publication for paired creation dates.
    #[serde(default)]
    pub creation_lead_days: Option<i64>,
}

impl SeriesTemplate {
    pub fn new(series_id: impl Into<String>, lane: Lane) -> Self {
        Self {
            series_id: series_id.into(),
            lane,
            creation_lead_days: None,
        }
    }

    pub fn with_creation_lead(mut self, days: i64) -> Self {
        self.creation_lead_days = Some(days);
        self
    }

    /// Build a publication-lane template from the parent's two dates.
    ///
    /// The lead is a whole number of calendar days, so children keep the
    /// same creation-to-publication gap across month ends and leap days.
    pub fn from_parent(
        series_id: impl Into<String>,
        creation: Option<NaiveDate>,
        publication: Option<NaiveDate>,
    ) -> Self {
        let lead = match (creation, publication) {
            (Some(created), Some(published)) => Some(days_between(created, published)),
            _ => None,
        };
        Self {
            series_id: series_id.into(),
            lane: Lane::Publication,
            creation_lead_days: lead,
        }
    }

    /// Creation date paired with a publication occurrence.
    pub fn paired_creation_date(&self, occurrence: NaiveDate) -> Option<NaiveDate> {
        if self.lane != Lane::Publication {
            return None;
        }
        self.creation_lead_days
            .map(|lead| add_days(occurrence, -lead))
    }
}
