//! Direct-manipulation gestures on the calendar.
//!
//! Picking an item up changes nothing. The drop issues exactly one
//! placement call, so there is no intermediate state to persist.

use chrono::NaiveDate;

use super::{Lane, PlacementStore, ScheduleCoordinator};
use crate::error::AssignError;

/// Where a dragged item is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// A calendar day in the item's lane.
    Day(NaiveDate),
    /// The lane's unscheduled pool.
    Pool,
}

/// An item held by a drag in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragGesture {
    pub item_id: String,
    pub lane: Lane,
    /// Date the item had when it was picked up.
    pub origin: Option<NaiveDate>,
}

impl DragGesture {
    /// Start dragging an item. Reads the current placement only.
    pub fn pick_up<S: PlacementStore>(
        coordinator: &ScheduleCoordinator<S>,
        item_id: &str,
        lane: Lane,
    ) -> Self {
        Self {
            item_id: item_id.to_string(),
            lane,
            origin: coordinator.placement(item_id, lane).and_then(|p| p.date),
        }
    }

    /// Release the item on a target.
    pub async fn drop_on<S: PlacementStore>(
        self,
        coordinator: &ScheduleCoordinator<S>,
        target: DropTarget,
    ) -> Result<(), AssignError> {
        match target {
            DropTarget::Day(date) => coordinator.assign(&self.item_id, self.lane, date).await,
            DropTarget::Pool => coordinator.unassign(&self.item_id, self.lane).await,
        }
    }

    /// Abandon the drag. Nothing was changed, so nothing is undone.
    pub fn cancel(self) {}
}
