use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::Lane;

/// Every confirmed placement change produces an event.
/// Open calendar views subscribe to keep in step with each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlacementEvent {
    /// Item placed on a date in a lane.
    Scheduled {
        item_id: String,
        lane: Lane,
        date: NaiveDate,
        previous: Option<NaiveDate>,
        at: DateTime<Utc>,
    },
    /// Item returned to the unscheduled pool of a lane.
    Unscheduled {
        item_id: String,
        lane: Lane,
        previous: Option<NaiveDate>,
        at: DateTime<Utc>,
    },
    /// All placements of an entity were removed.
    EntityRemoved {
        item_id: String,
        at: DateTime<Utc>,
    },
    /// Items created from a recurring series.
    SeriesGenerated {
        series_id: String,
        created: usize,
        failed: usize,
        truncated: bool,
        at: DateTime<Utc>,
    },
    /// A write targeted an entity that no longer exists.
    Conflict {
        item_id: String,
        lane: Lane,
        at: DateTime<Utc>,
    },
    /// A write could not reach the backing store; the intent is pending.
    TransportFailed {
        item_id: String,
        lane: Lane,
        message: String,
        at: DateTime<Utc>,
    },
}

impl PlacementEvent {
    /// Item the event refers to, if it is about a single item.
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::Scheduled { item_id, .. }
            | Self::Unscheduled { item_id, .. }
            | Self::EntityRemoved { item_id, .. }
            | Self::Conflict { item_id, .. }
            | Self::TransportFailed { item_id, .. } => Some(item_id),
            Self::SeriesGenerated { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let event = PlacementEvent::Unscheduled {
            item_id: "post-1".into(),
            lane: Lane::Creation,
            previous: NaiveDate::from_ymd_opt(2024, 5, 1),
            at: Utc::now(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "Unscheduled");
        assert_eq!(json["lane"], "creation");
        assert_eq!(event.item_id(), Some("post-1"));
    }
}
