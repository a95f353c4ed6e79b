//! SQLite-based placement store.
//!
//! Entities and their lane placements live in `<data_dir>/launchplan.db`.
//! A lane placement with a NULL date is in that lane's unscheduled pool.
//! The async store methods run their queries on tokio's blocking pool.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use super::data_dir;
use super::migrations;
use crate::error::{CoreError, DatabaseError, StoreError};
use crate::interval::Interval;
use crate::schedule::{Lane, PlacementStore, ScheduledItem};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_date(value: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn parse_lane(value: &str) -> Result<Lane, rusqlite::Error> {
    value.parse::<Lane>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// Build a ScheduledItem from a `(item_id, lane, date, series_id)` row
fn row_to_item(row: &rusqlite::Row) -> Result<ScheduledItem, rusqlite::Error> {
    let lane: String = row.get(1)?;
    let date: Option<String> = row.get(2)?;
    Ok(ScheduledItem {
        item_id: row.get(0)?,
        lane: parse_lane(&lane)?,
        date: date.as_deref().map(parse_date).transpose()?,
        series_id: row.get(3)?,
    })
}

/// Run a query off the async worker threads.
async fn blocking<T, E, F>(query: F) -> Result<T, StoreError>
where
    T: Send + 'static,
    E: Into<StoreError> + Send + 'static,
    F: FnOnce() -> Result<T, E> + Send + 'static,
{
    tokio::task::spawn_blocking(query)
        .await
        .map_err(|e| StoreError::Transport(format!("database task failed: {e}")))?
        .map_err(Into::into)
}

/// SQLite database for placements.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct PlacementDb {
    conn: Arc<Mutex<Connection>>,
}

impl PlacementDb {
    /// Open the placement database at `~/.config/launchplan/launchplan.db`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the
    /// database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("launchplan.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register an entity with no placements.
    pub fn insert_entity(&self, item_id: &str) -> Result<(), DatabaseError> {
        self.conn().execute(
            "INSERT OR IGNORE INTO entities (id, created_at) VALUES (?1, ?2)",
            params![item_id, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    pub fn entity_exists(&self, item_id: &str) -> Result<bool, DatabaseError> {
        let found = self
            .conn()
            .query_row(
                "SELECT 1 FROM entities WHERE id = ?1",
                params![item_id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Read one lane placement.
    pub fn get_placement(
        &self,
        item_id: &str,
        lane: Lane,
    ) -> Result<Option<ScheduledItem>, DatabaseError> {
        let item = self
            .conn()
            .query_row(
                "SELECT item_id, lane, date, series_id FROM placements
                 WHERE item_id = ?1 AND lane = ?2",
                params![item_id, lane.as_str()],
                row_to_item,
            )
            .optional()?;
        Ok(item)
    }

    /// All placements of a series, ordered by date.
    pub fn list_series(&self, series_id: &str) -> Result<Vec<ScheduledItem>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT item_id, lane, date, series_id FROM placements
             WHERE series_id = ?1
             ORDER BY date, item_id, lane",
        )?;
        let items = stmt
            .query_map(params![series_id], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn write(&self, item_id: &str, lane: Lane, date: Option<NaiveDate>) -> Result<(), StoreError> {
        let conn = self.conn();
        let exists = conn
            .query_row(
                "SELECT 1 FROM entities WHERE id = ?1",
                params![item_id],
                |_| Ok(()),
            )
            .optional()
            .map_err(DatabaseError::from)?;
        if exists.is_none() {
            return Err(StoreError::NotFound(item_id.to_string()));
        }

        conn.execute(
            "INSERT INTO placements (item_id, lane, date, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(item_id, lane) DO UPDATE SET
                date = excluded.date,
                updated_at = excluded.updated_at",
            params![
                item_id,
                lane.as_str(),
                date.map(format_date),
                Utc::now().to_rfc3339()
            ],
        )
        .map_err(DatabaseError::from)?;
        debug!(item_id, %lane, ?date, "placement stored");
        Ok(())
    }

    fn create(&self, item: &ScheduledItem) -> Result<(), DatabaseError> {
        let mut conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT OR IGNORE INTO entities (id, created_at) VALUES (?1, ?2)",
            params![item.item_id, now],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO placements (item_id, lane, date, series_id, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                item.item_id,
                item.lane.as_str(),
                item.date.map(format_date),
                item.series_id,
                now
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete(&self, item_id: &str) -> Result<(), DatabaseError> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM placements WHERE item_id = ?1", params![item_id])?;
        tx.execute("DELETE FROM entities WHERE id = ?1", params![item_id])?;
        tx.commit()?;
        Ok(())
    }

    fn unscheduled(&self, lane: Lane) -> Result<Vec<ScheduledItem>, DatabaseError> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT item_id, lane, date, series_id FROM placements
             WHERE lane = ?1 AND date IS NULL
             ORDER BY item_id",
        )?;
        let items = stmt
            .query_map(params![lane.as_str()], row_to_item)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn in_range(&self, range: Interval) -> Result<Vec<ScheduledItem>, DatabaseError> {
        let conn = self.conn();
        // ISO dates sort lexically in calendar order.
        let mut stmt = conn.prepare(
            "SELECT item_id, lane, date, series_id FROM placements
             WHERE date IS NOT NULL AND date >= ?1 AND date <= ?2
             ORDER BY date, item_id, lane",
        )?;
        let items = stmt
            .query_map(
                params![format_date(range.start), format_date(range.end)],
                row_to_item,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }
}

#[async_trait]
impl PlacementStore for PlacementDb {
    async fn write_placement(
        &self,
        item_id: &str,
        lane: Lane,
        date: Option<NaiveDate>,
    ) -> Result<(), StoreError> {
        let db = self.clone();
        let item_id = item_id.to_string();
        blocking(move || db.write(&item_id, lane, date)).await
    }

    async fn create_item(&self, item: &ScheduledItem) -> Result<(), StoreError> {
        let db = self.clone();
        let item = item.clone();
        blocking(move || db.create(&item)).await
    }

    async fn delete_entity(&self, item_id: &str) -> Result<(), StoreError> {
        let db = self.clone();
        let item_id = item_id.to_string();
        blocking(move || db.delete(&item_id)).await
    }

    async fn list_unscheduled(&self, lane: Lane) -> Result<Vec<ScheduledItem>, StoreError> {
        let db = self.clone();
        blocking(move || db.unscheduled(lane)).await
    }

    async fn list_in_range(&self, range: Interval) -> Result<Vec<ScheduledItem>, StoreError> {
        let db = self.clone();
        blocking(move || db.in_range(range)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[tokio::test]
    async fn write_requires_entity() {
        let db = PlacementDb::open_memory().unwrap();
        let err = db
            .write_placement("ghost", Lane::Creation, Some(d(2024, 5, 1)))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::NotFound("ghost".into()));

        db.insert_entity("post").unwrap();
        db.write_placement("post", Lane::Creation, Some(d(2024, 5, 1)))
            .await
            .unwrap();
        let stored = db.get_placement("post", Lane::Creation).unwrap().unwrap();
        assert_eq!(stored.date, Some(d(2024, 5, 1)));
    }

    #[tokio::test]
    async fn unassign_keeps_record_in_pool() {
        let db = PlacementDb::open_memory().unwrap();
        db.create_item(&ScheduledItem::new("post", Lane::Publication, Some(d(2024, 5, 3))))
            .await
            .unwrap();
        db.write_placement("post", Lane::Publication, None).await.unwrap();

        let pool = db.list_unscheduled(Lane::Publication).await.unwrap();
        assert_eq!(pool.len(), 1);
        assert!(db.list_unscheduled(Lane::Creation).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn range_is_inclusive_and_ordered() {
        let db = PlacementDb::open_memory().unwrap();
        for (id, day) in [("b", 10), ("a", 10), ("c", 1), ("d", 31)] {
            db.create_item(&ScheduledItem::new(id, Lane::Creation, Some(d(2024, 5, day))))
                .await
                .unwrap();
        }
        let items = db
            .list_in_range(Interval::new(d(2024, 5, 1), d(2024, 5, 10)).unwrap())
            .await
            .unwrap();
        let ids: Vec<&str> = items.iter().map(|i| i.item_id.as_str()).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn series_id_survives_date_changes() {
        let db = PlacementDb::open_memory().unwrap();
        db.create_item(
            &ScheduledItem::new("child", Lane::Publication, Some(d(2024, 5, 3))).with_series("s1"),
        )
        .await
        .unwrap();
        db.write_placement("child", Lane::Publication, Some(d(2024, 5, 4)))
            .await
            .unwrap();
        let series = db.list_series("s1").unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].date, Some(d(2024, 5, 4)));
    }

    #[tokio::test]
    async fn delete_removes_entity_and_lanes() {
        let db = PlacementDb::open_memory().unwrap();
        db.create_item(&ScheduledItem::new("post", Lane::Creation, Some(d(2024, 5, 1))))
            .await
            .unwrap();
        db.create_item(&ScheduledItem::new("post", Lane::Publication, None))
            .await
            .unwrap();
        db.delete_entity("post").await.unwrap();

        assert!(!db.entity_exists("post").unwrap());
        assert!(db.get_placement("post", Lane::Creation).unwrap().is_none());
        assert!(matches!(
            db.write_placement("post", Lane::Creation, None).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn file_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("launchplan.db");
        {
            let db = PlacementDb::open_at(&path).unwrap();
            db.create_item(&ScheduledItem::new("post", Lane::Creation, Some(d(2024, 5, 1))))
                .await
                .unwrap();
        }
        let db = PlacementDb::open_at(&path).unwrap();
        let stored = db.get_placement("post", Lane::Creation).unwrap().unwrap();
        assert_eq!(stored.date, Some(d(2024, 5, 1)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_writes_share_one_connection() {
        let db = Arc::new(PlacementDb::open_memory().unwrap());
        let handles: Vec<_> = (1..=16u32)
            .map(|day| {
                let db = db.clone();
                tokio::spawn(async move {
                    let item = ScheduledItem::new(format!("post-{day:02}"), Lane::Creation, None);
                    db.create_item(&item).await?;
                    db.write_placement(&item.item_id, Lane::Creation, Some(d(2024, 5, day)))
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let items = db
            .list_in_range(Interval::new(d(2024, 5, 1), d(2024, 5, 31)).unwrap())
            .await
            .unwrap();
        assert_eq!(items.len(), 16);
        assert!(db.list_unscheduled(Lane::Creation).await.unwrap().is_empty());
    }
}
