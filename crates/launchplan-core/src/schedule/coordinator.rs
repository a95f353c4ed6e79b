//! Serialized placement writes with a confirmed local view.
//!
//! Writes to the same item are serialized through a per-item FIFO lock, so
//! racing requests apply in arrival order and the last one wins. The local
//! view only changes after the store confirms a write. A write that fails
//! in transport stays in the pending list until it is retried or
//! superseded. Only placement writes become pending intents; a failed
//! create or remove is returned to the caller to repeat.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{Lane, PlacementStore, ScheduledItem, SeriesTemplate};
use crate::error::{AssignError, StoreError, ValidationError};
use crate::events::PlacementEvent;
use crate::interval::Interval;
use crate::recurrence::{expand, RecurrencePattern};

const EVENT_CAPACITY: usize = 256;

type PlacementKey = (String, Lane);
type ItemLocks = Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>;

/// A placement write that has not been confirmed by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingIntent {
    pub item_id: String,
    pub lane: Lane,
    pub date: Option<NaiveDate>,
    /// Arrival order at the coordinator.
    pub sequence: u64,
    /// Failed store attempts for this intent.
    pub attempts: u32,
    pub last_error: Option<String>,
}

/// Result of replaying one pending intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryOutcome {
    pub item_id: String,
    pub lane: Lane,
    pub result: Result<(), AssignError>,
}

/// One failed step of a bulk generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationFailure {
    pub occurrence: NaiveDate,
    /// Id minted for the occurrence; shared by both of its lanes.
    pub item_id: String,
    pub lane: Lane,
    pub date: NaiveDate,
    pub error: String,
    pub retryable: bool,
}

/// Items materialized from a recurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkGeneration {
    pub series_id: String,
    pub created: Vec<ScheduledItem>,
    pub failed: Vec<GenerationFailure>,
    /// Expansion hit the occurrence cap.
    pub truncated: bool,
}

impl BulkGeneration {
    fn empty(series_id: &str) -> Self {
        Self {
            series_id: series_id.to_string(),
            created: Vec::new(),
            failed: Vec::new(),
            truncated: false,
        }
    }
}

/// The only write surface for calendar placement.
pub struct ScheduleCoordinator<S> {
    store: Arc<S>,
    view: RwLock<HashMap<PlacementKey, ScheduledItem>>,
    window: RwLock<Option<Interval>>,
    item_locks: ItemLocks,
    pending: Mutex<HashMap<PlacementKey, PendingIntent>>,
    sequence: AtomicU64,
    events: broadcast::Sender<PlacementEvent>,
}

/// Exclusive write access to one item.
///
/// The lock entry is dropped from the map once nobody holds or waits on it.
struct ItemGuard<'a> {
    locks: &'a ItemLocks,
    item_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for ItemGuard<'_> {
    fn drop(&mut self) {
        // Waiters clone the entry under the map lock, so the count is stable here.
        let mut locks = lock(self.locks);
        drop(self.guard.take());
        if locks
            .get(&self.item_id)
            .is_some_and(|entry| Arc::strong_count(entry) == 1)
        {
            locks.remove(&self.item_id);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl<S: PlacementStore> ScheduleCoordinator<S> {
    pub fn new(store: Arc<S>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store,
            view: RwLock::new(HashMap::new()),
            window: RwLock::new(None),
            item_locks: Mutex::new(HashMap::new()),
            pending: Mutex::new(HashMap::new()),
            sequence: AtomicU64::new(0),
            events,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Receive every confirmed placement change from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<PlacementEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: PlacementEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    async fn lock_item(&self, item_id: &str) -> ItemGuard<'_> {
        let item_lock = lock(&self.item_locks)
            .entry(item_id.to_string())
            .or_default()
            .clone();
        let guard = item_lock.lock_owned().await;
        ItemGuard {
            locks: &self.item_locks,
            item_id: item_id.to_string(),
            guard: Some(guard),
        }
    }

    // === Viewing window ===

    /// Replace the local view with the store's placements for `range` plus
    /// both unscheduled pools. Returns the number of placements loaded.
    pub async fn load_window(&self, range: Interval) -> Result<usize, StoreError> {
        let mut loaded = self.store.list_in_range(range).await?;
        for lane in Lane::ALL {
            loaded.extend(self.store.list_unscheduled(lane).await?);
        }

        let count = loaded.len();
        let mut view = write(&self.view);
        view.clear();
        for item in loaded {
            view.insert((item.item_id.clone(), item.lane), item);
        }
        *write(&self.window) = Some(range);
        debug!(%range, count, "loaded viewing window");
        Ok(count)
    }

    pub fn window(&self) -> Option<Interval> {
        *read(&self.window)
    }

    pub fn placement(&self, item_id: &str, lane: Lane) -> Option<ScheduledItem> {
        read(&self.view).get(&(item_id.to_string(), lane)).cloned()
    }

    /// Items placed on a given day in a lane, ordered by id.
    pub fn items_on(&self, date: NaiveDate, lane: Lane) -> Vec<ScheduledItem> {
        let mut items: Vec<ScheduledItem> = read(&self.view)
            .values()
            .filter(|item| item.lane == lane && item.date == Some(date))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        items
    }

    /// Unscheduled items of a lane, ordered by id.
    pub fn pool(&self, lane: Lane) -> Vec<ScheduledItem> {
        let mut items: Vec<ScheduledItem> = read(&self.view)
            .values()
            .filter(|item| item.lane == lane && item.date.is_none())
            .cloned()
            .collect();
        items.sort_by(|a, b| a.item_id.cmp(&b.item_id));
        items
    }

    /// Every placement in the local view, ordered by date then id.
    pub fn placements(&self) -> Vec<ScheduledItem> {
        let mut items: Vec<ScheduledItem> = read(&self.view).values().cloned().collect();
        items.sort_by(|a, b| (a.date, &a.item_id, a.lane).cmp(&(b.date, &b.item_id, b.lane)));
        items
    }

    // === Writes ===

    /// Create a new placement record.
    ///
    /// A transport failure is returned as-is and not kept as a pending
    /// intent.
    pub async fn create_item(&self, item: ScheduledItem) -> Result<(), AssignError> {
        let _guard = self.lock_item(&item.item_id).await;
        self.store
            .create_item(&item)
            .await
            .map_err(|e| AssignError::from_store(e, &item.item_id, Some(item.lane)))?;
        self.confirm(&item.item_id, item.lane, item.date, item.series_id.clone());
        Ok(())
    }

    /// Place an item on a date in one lane.
    ///
    /// Any number of items may share a date. Returns
    /// [`AssignError::Conflict`] when the entity was deleted elsewhere.
    pub async fn assign(&self, item_id: &str, lane: Lane, date: NaiveDate) -> Result<(), AssignError> {
        let _guard = self.lock_item(item_id).await;
        self.write_locked(item_id, lane, Some(date)).await
    }

    /// Return an item to the unscheduled pool of one lane.
    ///
    /// The other lane is not touched.
    pub async fn unassign(&self, item_id: &str, lane: Lane) -> Result<(), AssignError> {
        let _guard = self.lock_item(item_id).await;
        self.write_locked(item_id, lane, None).await
    }

    /// Update both lanes of an item as one step.
    ///
    /// No other write to the item runs in between. Both lanes are always
    /// attempted; on failure the error names the lanes that were applied
    /// and the ones that need a retry.
    pub async fn move_both_lanes(
        &self,
        item_id: &str,
        creation: Option<NaiveDate>,
        publication: Option<NaiveDate>,
    ) -> Result<(), AssignError> {
        let _guard = self.lock_item(item_id).await;

        let mut applied = Vec::new();
        let mut failed = Vec::new();
        for (lane, date) in [(Lane::Creation, creation), (Lane::Publication, publication)] {
            match self.write_locked(item_id, lane, date).await {
                Ok(()) => applied.push(lane),
                Err(err) => failed.push((lane, err)),
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(AssignError::PartialMove { applied, failed })
        }
    }

    /// Delete an entity and every placement it holds.
    ///
    /// Writes queued behind the removal still run in order and report
    /// [`AssignError::Conflict`]. A transport failure is returned as-is and
    /// not kept as a pending intent.
    pub async fn remove_entity(&self, item_id: &str) -> Result<(), AssignError> {
        let _guard = self.lock_item(item_id).await;
        self.store
            .delete_entity(item_id)
            .await
            .map_err(|e| AssignError::from_store(e, item_id, None))?;
        self.forget(item_id);
        info!(item_id, "entity removed");
        self.emit(PlacementEvent::EntityRemoved {
            item_id: item_id.to_string(),
            at: Utc::now(),
        });
        Ok(())
    }

    /// Caller must hold the item lock.
    async fn write_locked(
        &self,
        item_id: &str,
        lane: Lane,
        date: Option<NaiveDate>,
    ) -> Result<(), AssignError> {
        let sequence = self.record_intent(item_id, lane, date);

        match self.store.write_placement(item_id, lane, date).await {
            Ok(()) => {
                self.clear_intent(item_id, lane, sequence);
                let series_id = self.placement(item_id, lane).and_then(|p| p.series_id);
                self.confirm(item_id, lane, date, series_id);
                Ok(())
            }
            Err(StoreError::NotFound(_)) => {
                self.clear_intent(item_id, lane, sequence);
                self.forget(item_id);
                warn!(item_id, %lane, "placement target no longer exists");
                self.emit(PlacementEvent::Conflict {
                    item_id: item_id.to_string(),
                    lane,
                    at: Utc::now(),
                });
                Err(AssignError::Conflict {
                    item_id: item_id.to_string(),
                })
            }
            Err(StoreError::Transport(message)) => {
                self.mark_failed(item_id, lane, sequence, &message);
                warn!(item_id, %lane, error = %message, "placement write failed; intent kept");
                self.emit(PlacementEvent::TransportFailed {
                    item_id: item_id.to_string(),
                    lane,
                    message: message.clone(),
                    at: Utc::now(),
                });
                Err(AssignError::Transport {
                    item_id: item_id.to_string(),
                    lane: Some(lane),
                    message,
                })
            }
        }
    }

    /// Apply a store-confirmed placement to the local view.
    fn confirm(&self, item_id: &str, lane: Lane, date: Option<NaiveDate>, series_id: Option<String>) {
        let previous = {
            let mut view = write(&self.view);
            let entry = view
                .entry((item_id.to_string(), lane))
                .or_insert_with(|| ScheduledItem::new(item_id, lane, None));
            let previous = entry.date;
            entry.date = date;
            entry.series_id = series_id;
            previous
        };

        let at = Utc::now();
        match date {
            Some(date) => {
                info!(item_id, %lane, %date, "item scheduled");
                self.emit(PlacementEvent::Scheduled {
                    item_id: item_id.to_string(),
                    lane,
                    date,
                    previous,
                    at,
                });
            }
            None => {
                info!(item_id, %lane, "item unscheduled");
                self.emit(PlacementEvent::Unscheduled {
                    item_id: item_id.to_string(),
                    lane,
                    previous,
                    at,
                });
            }
        }
    }

    fn forget(&self, item_id: &str) {
        write(&self.view).retain(|(id, _), _| id != item_id);
        lock(&self.pending).retain(|(id, _), _| id != item_id);
    }

    // === Pending intents ===

    fn record_intent(&self, item_id: &str, lane: Lane, date: Option<NaiveDate>) -> u64 {
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let mut pending = lock(&self.pending);
        let key = (item_id.to_string(), lane);
        let attempts = pending
            .get(&key)
            .filter(|existing| existing.date == date)
            .map_or(0, |existing| existing.attempts);
        pending.insert(
            key,
            PendingIntent {
                item_id: item_id.to_string(),
                lane,
                date,
                sequence,
                attempts,
                last_error: None,
            },
        );
        sequence
    }

    fn clear_intent(&self, item_id: &str, lane: Lane, sequence: u64) {
        let mut pending = lock(&self.pending);
        let key = (item_id.to_string(), lane);
        if pending.get(&key).is_some_and(|p| p.sequence == sequence) {
            pending.remove(&key);
        }
    }

    fn mark_failed(&self, item_id: &str, lane: Lane, sequence: u64, message: &str) {
        let mut pending = lock(&self.pending);
        if let Some(intent) = pending.get_mut(&(item_id.to_string(), lane)) {
            if intent.sequence == sequence {
                intent.attempts += 1;
                intent.last_error = Some(message.to_string());
            }
        }
    }

    /// Writes that failed in transport and have not been superseded.
    pub fn pending_intents(&self) -> Vec<PendingIntent> {
        let mut intents: Vec<PendingIntent> = lock(&self.pending)
            .values()
            .filter(|intent| intent.attempts > 0)
            .cloned()
            .collect();
        intents.sort_by_key(|intent| intent.sequence);
        intents
    }

    /// Replay every pending intent in arrival order.
    pub async fn retry_pending(&self) -> Vec<RetryOutcome> {
        let mut outcomes = Vec::new();
        for intent in self.pending_intents() {
            let _guard = self.lock_item(&intent.item_id).await;

            // Skip intents resolved or replaced while waiting for the lock.
            let still_pending = lock(&self.pending)
                .get(&(intent.item_id.clone(), intent.lane))
                .is_some_and(|current| current.sequence == intent.sequence);
            if !still_pending {
                continue;
            }

            let result = self.write_locked(&intent.item_id, intent.lane, intent.date).await;
            outcomes.push(RetryOutcome {
                item_id: intent.item_id,
                lane: intent.lane,
                result,
            });
        }
        outcomes
    }

    // === Recurring series ===

    /// Create one placement per occurrence after the first.
    ///
    /// The first occurrence is the already-created parent and is skipped.
    /// Each child gets a fresh id and a back-reference to the series.
    ///
    /// # Errors
    /// Returns a [`ValidationError`] for an incomplete pattern; nothing is
    /// created in that case. Store failures are reported per occurrence in
    /// [`BulkGeneration::failed`].
    pub async fn bulk_generate_from_recurrence(
        &self,
        pattern: &RecurrencePattern,
        template: &SeriesTemplate,
        first_date: NaiveDate,
    ) -> Result<BulkGeneration, ValidationError> {
        let expansion = expand(pattern, first_date)?;
        let occurrences: Vec<NaiveDate> = expansion.dates.iter().skip(1).copied().collect();

        let mut generation = self.generate_for_dates(template, &occurrences).await;
        generation.truncated = expansion.truncated;

        self.emit(PlacementEvent::SeriesGenerated {
            series_id: template.series_id.clone(),
            created: generation.created.len(),
            failed: generation.failed.len(),
            truncated: generation.truncated,
            at: Utc::now(),
        });
        Ok(generation)
    }

    /// Create series children for explicit occurrence dates.
    ///
    /// Every occurrence gets a fresh id. To finish a generation that
    /// partly failed, use [`Self::resume_generation`] instead.
    pub async fn generate_for_dates(
        &self,
        template: &SeriesTemplate,
        occurrences: &[NaiveDate],
    ) -> BulkGeneration {
        let mut generation = BulkGeneration::empty(&template.series_id);

        for &occurrence in occurrences {
            let item_id = Uuid::new_v4().to_string();
            let mut placements = vec![(template.lane, occurrence)];
            if let Some(creation) = template.paired_creation_date(occurrence) {
                placements.push((Lane::Creation, creation));
            }

            for (lane, date) in placements {
                self.create_series_item(&mut generation, occurrence, &item_id, lane, date)
                    .await;
            }
        }

        info!(
            series_id = %template.series_id,
            created = generation.created.len(),
            failed = generation.failed.len(),
            "series items generated"
        );
        generation
    }

    /// Retry only the failed steps of an earlier generation.
    ///
    /// Each step is replayed under the id it was first given, so lanes that
    /// already succeeded are not created twice.
    pub async fn resume_generation(&self, previous: &BulkGeneration) -> BulkGeneration {
        let mut generation = BulkGeneration::empty(&previous.series_id);
        for failure in &previous.failed {
            self.create_series_item(
                &mut generation,
                failure.occurrence,
                &failure.item_id,
                failure.lane,
                failure.date,
            )
            .await;
        }

        info!(
            series_id = %previous.series_id,
            created = generation.created.len(),
            failed = generation.failed.len(),
            "series generation resumed"
        );
        generation
    }

    async fn create_series_item(
        &self,
        generation: &mut BulkGeneration,
        occurrence: NaiveDate,
        item_id: &str,
        lane: Lane,
        date: NaiveDate,
    ) {
        let item =
            ScheduledItem::new(item_id, lane, Some(date)).with_series(generation.series_id.clone());
        match self.create_item(item.clone()).await {
            Ok(()) => generation.created.push(item),
            Err(err) => {
                warn!(
                    series_id = %generation.series_id,
                    %occurrence,
                    %lane,
                    error = %err,
                    "series item creation failed"
                );
                generation.failed.push(GenerationFailure {
                    occurrence,
                    item_id: item_id.to_string(),
                    lane,
                    date,
                    retryable: err.is_retryable(),
                    error: err.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::Termination;
    use crate::schedule::InMemoryStore;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn coordinator() -> ScheduleCoordinator<InMemoryStore> {
        let store = InMemoryStore::new();
        store.insert_entity("item1");
        ScheduleCoordinator::new(Arc::new(store))
    }

    #[tokio::test]
    async fn unassign_leaves_other_lane_untouched() {
        let coord = coordinator();
        coord.assign("item1", Lane::Publication, d(2024, 5, 3)).await.unwrap();
        coord.assign("item1", Lane::Creation, d(2024, 5, 1)).await.unwrap();
        coord.unassign("item1", Lane::Creation).await.unwrap();

        assert_eq!(coord.placement("item1", Lane::Creation).unwrap().date, None);
        assert_eq!(
            coord.placement("item1", Lane::Publication).unwrap().date,
            Some(d(2024, 5, 3))
        );
        assert_eq!(coord.pool(Lane::Creation).len(), 1);
        assert!(coord.pool(Lane::Publication).is_empty());
    }

    #[tokio::test]
    async fn items_may_share_a_coordinate() {
        let coord = coordinator();
        coord.store().insert_entity("item2");
        coord.assign("item1", Lane::Publication, d(2024, 5, 3)).await.unwrap();
        coord.assign("item2", Lane::Publication, d(2024, 5, 3)).await.unwrap();
        assert_eq!(coord.items_on(d(2024, 5, 3), Lane::Publication).len(), 2);
    }

    #[tokio::test]
    async fn deleted_entity_reports_conflict() {
        let coord = coordinator();
        coord.assign("item1", Lane::Creation, d(2024, 5, 1)).await.unwrap();
        coord.store().remove_entity_externally("item1");

        let err = coord.assign("item1", Lane::Creation, d(2024, 5, 2)).await.unwrap_err();
        assert_eq!(err, AssignError::Conflict { item_id: "item1".into() });
        assert!(coord.placement("item1", Lane::Creation).is_none());
        assert!(coord.pending_intents().is_empty());
    }

    #[tokio::test]
    async fn transport_failure_keeps_intent_and_view() {
        let coord = coordinator();
        coord.assign("item1", Lane::Creation, d(2024, 5, 1)).await.unwrap();
        coord.store().set_offline(true);

        let err = coord.assign("item1", Lane::Creation, d(2024, 5, 9)).await.unwrap_err();
        assert!(matches!(err, AssignError::Transport { .. }));
        // Unconfirmed write does not reach the view
        assert_eq!(
            coord.placement("item1", Lane::Creation).unwrap().date,
            Some(d(2024, 5, 1))
        );

        let pending = coord.pending_intents();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].date, Some(d(2024, 5, 9)));
        assert_eq!(pending[0].attempts, 1);

        coord.store().set_offline(false);
        let outcomes = coord.retry_pending().await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].result.is_ok());
        assert!(coord.pending_intents().is_empty());
        assert_eq!(
            coord.placement("item1", Lane::Creation).unwrap().date,
            Some(d(2024, 5, 9))
        );
    }

    #[tokio::test]
    async fn newer_write_supersedes_pending_intent() {
        let coord = coordinator();
        coord.store().set_offline(true);
        let _ = coord.assign("item1", Lane::Creation, d(2024, 5, 9)).await;
        coord.store().set_offline(false);
        coord.assign("item1", Lane::Creation, d(2024, 5, 12)).await.unwrap();

        assert!(coord.pending_intents().is_empty());
        assert!(coord.retry_pending().await.is_empty());
        assert_eq!(
            coord.placement("item1", Lane::Creation).unwrap().date,
            Some(d(2024, 5, 12))
        );
    }

    #[tokio::test]
    async fn move_both_lanes_reports_failed_lane() {
        let coord = coordinator();
        coord.store().fail_lane(Lane::Publication);

        let err = coord
            .move_both_lanes("item1", Some(d(2024, 5, 1)), Some(d(2024, 5, 4)))
            .await
            .unwrap_err();
        match err {
            AssignError::PartialMove { applied, failed } => {
                assert_eq!(applied, vec![Lane::Creation]);
                assert_eq!(failed.len(), 1);
                assert_eq!(failed[0].0, Lane::Publication);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(
            coord.placement("item1", Lane::Creation).unwrap().date,
            Some(d(2024, 5, 1))
        );
        assert!(coord.placement("item1", Lane::Publication).is_none());

        coord.store().restore_lane(Lane::Publication);
        coord.assign("item1", Lane::Publication, d(2024, 5, 4)).await.unwrap();
    }

    #[tokio::test]
    async fn bulk_generation_skips_parent_and_tags_series() {
        let coord = coordinator();
        let pattern = RecurrencePattern::weekly([1, 3], Termination::AfterCount { count: 4 });
        let template = SeriesTemplate::new("item1", Lane::Publication);

        let generation = coord
            .bulk_generate_from_recurrence(&pattern, &template, d(2024, 3, 4))
            .await
            .unwrap();

        let dates: Vec<_> = generation.created.iter().filter_map(|i| i.date).collect();
        assert_eq!(dates, vec![d(2024, 3, 6), d(2024, 3, 11), d(2024, 3, 13)]);
        assert!(generation
            .created
            .iter()
            .all(|i| i.series_id.as_deref() == Some("item1")));
        assert!(generation.failed.is_empty());
        assert!(!generation.truncated);
    }

    #[tokio::test]
    async fn bulk_generation_pairs_creation_dates() {
        let coord = coordinator();
        let pattern = RecurrencePattern::monthly(31, Termination::AfterCount { count: 2 });
        let template = SeriesTemplate::from_parent("item1", Some(d(2024, 1, 28)), Some(d(2024, 1, 31)));

        let generation = coord
            .bulk_generate_from_recurrence(&pattern, &template, d(2024, 1, 31))
            .await
            .unwrap();

        assert_eq!(generation.created.len(), 2);
        let publication = &generation.created[0];
        let creation = &generation.created[1];
        assert_eq!(publication.item_id, creation.item_id);
        assert_eq!(publication.date, Some(d(2024, 2, 29)));
        assert_eq!(creation.lane, Lane::Creation);
        assert_eq!(creation.date, Some(d(2024, 2, 26)));
    }

    #[tokio::test]
    async fn bulk_generation_rejects_incomplete_pattern() {
        let coord = coordinator();
        let mut pattern = RecurrencePattern::monthly(1, Termination::Never);
        pattern.month_day = None;
        let template = SeriesTemplate::new("item1", Lane::Publication);
        assert!(coord
            .bulk_generate_from_recurrence(&pattern, &template, d(2024, 3, 4))
            .await
            .is_err());
        assert_eq!(coord.store().entity_count(), 1);
    }

    #[tokio::test]
    async fn remove_entity_clears_both_lanes() {
        let coord = coordinator();
        let mut events = coord.subscribe();
        coord
            .move_both_lanes("item1", Some(d(2024, 5, 1)), Some(d(2024, 5, 4)))
            .await
            .unwrap();
        coord.remove_entity("item1").await.unwrap();

        assert!(coord.placements().is_empty());
        let mut last = None;
        while let Ok(event) = events.try_recv() {
            last = Some(event);
        }
        assert!(matches!(last, Some(PlacementEvent::EntityRemoved { .. })));
    }

    #[tokio::test]
    async fn idle_item_locks_are_pruned() {
        let coord = coordinator();
        coord.store().insert_entity("item2");
        coord.assign("item1", Lane::Creation, d(2024, 5, 1)).await.unwrap();
        coord
            .move_both_lanes("item2", Some(d(2024, 5, 2)), None)
            .await
            .unwrap();
        coord.remove_entity("item1").await.unwrap();
        let _ = coord.assign("ghost", Lane::Creation, d(2024, 5, 1)).await;

        assert!(lock(&coord.item_locks).is_empty());
    }

    #[tokio::test]
    async fn failed_create_is_returned_not_queued() {
        let coord = coordinator();
        coord.store().set_offline(true);

        let err = coord
            .create_item(ScheduledItem::new("item2", Lane::Creation, Some(d(2024, 5, 1))))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert!(coord.remove_entity("item1").await.unwrap_err().is_retryable());

        assert!(coord.pending_intents().is_empty());
        assert!(coord.retry_pending().await.is_empty());
        assert!(coord.placement("item2", Lane::Creation).is_none());
    }
}
