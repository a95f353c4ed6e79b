//! Backing store seam for placements.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{Lane, ScheduledItem};
use crate::error::StoreError;
use crate::interval::Interval;

/// Content store that owns placement records.
///
/// Implementations may be remote; every call can fail or be slow. A write
/// to an entity that no longer exists must return [`StoreError::NotFound`].
#[async_trait]
pub trait PlacementStore: Send + Sync {
    /// Set or clear the date of one lane placement.
    async fn write_placement(
        &self,
        item_id: &str,
        lane: Lane,
        date: Option<NaiveDate>,
    ) -> Result<(), StoreError>;

    /// Create a placement record, registering its entity if needed.
    async fn create_item(&self, item: &ScheduledItem) -> Result<(), StoreError>;

    /// Delete an entity and all of its placements.
    async fn delete_entity(&self, item_id: &str) -> Result<(), StoreError>;

    /// Unscheduled placements of a lane.
    async fn list_unscheduled(&self, lane: Lane) -> Result<Vec<ScheduledItem>, StoreError>;

    /// Scheduled placements, in any lane, whose date falls in `range`.
    async fn list_in_range(&self, range: Interval) -> Result<Vec<ScheduledItem>, StoreError>;
}

#[derive(Default)]
struct MemoryState {
    entities: HashSet<String>,
    placements: HashMap<(String, Lane), ScheduledItem>,
    failing_lanes: HashSet<Lane>,
    offline: bool,
}

/// Process-local store for previews and tests.
///
/// Failures can be injected per lane or for the whole store to exercise
/// transport-error handling.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an entity without placing it in any lane.
    pub fn insert_entity(&self, item_id: &str) {
        self.lock().entities.insert(item_id.to_string());
    }

    /// Delete an entity behind the coordinator's back, as another actor would.
    pub fn remove_entity_externally(&self, item_id: &str) {
        let mut state = self.lock();
        state.entities.remove(item_id);
        state.placements.retain(|(id, _), _| id != item_id);
    }

    pub fn placement(&self, item_id: &str, lane: Lane) -> Option<ScheduledItem> {
        self.lock()
            .placements
            .get(&(item_id.to_string(), lane))
            .cloned()
    }

    pub fn entity_count(&self) -> usize {
        self.lock().entities.len()
    }

    /// Make every write to `lane` fail with a transport error.
    pub fn fail_lane(&self, lane: Lane) {
        self.lock().failing_lanes.insert(lane);
    }

    pub fn restore_lane(&self, lane: Lane) {
        self.lock().failing_lanes.remove(&lane);
    }

    /// Make every call fail with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.lock().offline = offline;
    }

    fn check_available(state: &MemoryState, lane: Option<Lane>) -> Result<(), StoreError> {
        if state.offline {
            return Err(StoreError::Transport("store offline".into()));
        }
        if let Some(lane) = lane {
            if state.failing_lanes.contains(&lane) {
                return Err(StoreError::Transport(format!("{lane} lane unavailable")));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl PlacementStore for InMemoryStore {
    async fn write_placement(
        &self,
        item_id: &str,
        lane: Lane,
        date: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_available(&state, Some(lane))?;
        if !state.entities.contains(item_id) {
            return Err(StoreError::NotFound(item_id.to_string()));
        }
        state
            .placements
            .entry((item_id.to_string(), lane))
            .and_modify(|item| item.date = date)
            .or_insert_with(|| ScheduledItem::new(item_id, lane, date));
        Ok(())
    }

    async fn create_item(&self, item: &ScheduledItem) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_available(&state, Some(item.lane))?;
        state.entities.insert(item.item_id.clone());
        state
            .placements
            .insert((item.item_id.clone(), item.lane), item.clone());
        Ok(())
    }

    async fn delete_entity(&self, item_id: &str) -> Result<(), StoreError> {
        let mut state = self.lock();
        Self::check_available(&state, None)?;
        state.entities.remove(item_id);
        state.placements.retain(|(id, _), _| id != item_id);
        Ok(())
    }

    async fn list_unscheduled(&self, lane: Lane) -> Result<Vec<ScheduledItem>, StoreError> {
        let state = self.lock();
        Self::check_available(&state, None)?;
        let mut items: Vec<ScheduledItem> = state
            .placements
            .values()
            .filter(|item| item.lane == lane && item.date.is_none())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        Ok(items)
    }

    async fn list_in_range(&self, range: Interval) -> Result<Vec<ScheduledItem>, StoreError> {
        let state = self.lock();
        Self::check_available(&state, None)?;
        let mut items: Vec<ScheduledItem> = state
            .placements
            .values()
            .filter(|item| item.date.is_some_and(|date| range.contains(date)))
            .cloned()
            .collect();
        items.sort_by(|a, b| (a.date, &a.item_id, a.lane).cmp(&(b.date, &b.item_id, b.lane)));
        Ok(items)
    }
}
