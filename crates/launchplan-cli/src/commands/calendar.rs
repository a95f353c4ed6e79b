//! Content calendar commands.
//!
//! Every write goes through the schedule coordinator backed by the SQLite
//! placement database.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::Subcommand;
use launchplan_core::{
    Interval, Lane, PlacementDb, PlacementStore, ScheduleCoordinator, ScheduledItem,
    SeriesTemplate,
};
use serde_json::json;

use super::{print_json, CmdResult, PatternArgs};

/// A day on the calendar or the unscheduled pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Day(NaiveDate),
    Pool,
}

impl Slot {
    fn date(self) -> Option<NaiveDate> {
        match self {
            Slot::Day(date) => Some(date),
            Slot::Pool => None,
        }
    }
}

impl std::str::FromStr for Slot {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pool" | "none" => Ok(Slot::Pool),
            other => other
                .parse::<NaiveDate>()
                .map(Slot::Day)
                .map_err(|e| format!("expected YYYY-MM-DD or 'pool', got '{other}': {e}")),
        }
    }
}

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Place an item on a day in one lane
    Assign {
        /// Item ID
        item: String,
        /// creation or publication
        lane: Lane,
        /// Target day (YYYY-MM-DD)
        date: NaiveDate,
        /// Register the item first if it does not exist
        #[arg(long)]
        create: bool,
    },
    /// Return an item to the unscheduled pool of one lane
    Unassign {
        /// Item ID
        item: String,
        /// creation or publication
        lane: Lane,
    },
    /// Move both lanes of an item at once
    Move {
        /// Item ID
        item: String,
        /// New creation day, or "pool"
        #[arg(long)]
        creation: Option<Slot>,
        /// New publication day, or "pool"
        #[arg(long)]
        publication: Option<Slot>,
    },
    /// List scheduled items in a date range
    List {
        /// First day (inclusive)
        from: NaiveDate,
        /// Last day (inclusive)
        to: NaiveDate,
        /// Only show one lane
        #[arg(long)]
        lane: Option<Lane>,
    },
    /// List unscheduled items of a lane
    Pool {
        /// creation or publication
        lane: Lane,
    },
    /// Create series items from a recurrence pattern
    Generate {
        /// Parent item that owns the series
        series: String,
        /// First occurrence; it belongs to the parent and is not recreated
        first: NaiveDate,
        #[command(flatten)]
        pattern: PatternArgs,
        /// Lane that receives the occurrence dates
        #[arg(long, default_value = "publication")]
        lane: Lane,
        /// Also schedule creation this many days before each publication
        #[arg(long)]
        creation_lead: Option<i64>,
    },
    /// Delete an item and all of its placements
    Remove {
        /// Item ID
        item: String,
    },
}

fn open_db(path: Option<PathBuf>) -> Result<PlacementDb, Box<dyn std::error::Error>> {
    Ok(match path {
        Some(path) => PlacementDb::open_at(&path)?,
        None => PlacementDb::open()?,
    })
}

pub fn run(action: CalendarAction, db: Option<PathBuf>, json: bool) -> CmdResult {
    let coordinator = ScheduleCoordinator::new(Arc::new(open_db(db)?));
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run_async(action, &coordinator, json))
}

async fn run_async(
    action: CalendarAction,
    coordinator: &ScheduleCoordinator<PlacementDb>,
    json: bool,
) -> CmdResult {
    match action {
        CalendarAction::Assign {
            item,
            lane,
            date,
            create,
        } => {
            if create && !coordinator.store().entity_exists(&item)? {
                coordinator
                    .create_item(ScheduledItem::new(item.clone(), lane, Some(date)))
                    .await?;
            } else {
                coordinator.assign(&item, lane, date).await?;
            }
            let placement = ScheduledItem::new(item, lane, Some(date));
            if json {
                print_json(&placement)?;
            } else {
                println!("{} scheduled for {} in {}", placement.item_id, date, lane);
            }
        }
        CalendarAction::Unassign { item, lane } => {
            coordinator.unassign(&item, lane).await?;
            if json {
                print_json(&ScheduledItem::new(item, lane, None))?;
            } else {
                println!("{item} moved to the {lane} pool");
            }
        }
        CalendarAction::Move {
            item,
            creation,
            publication,
        } => {
            if creation.is_none() && publication.is_none() {
                return Err("nothing to move: pass --creation and/or --publication".into());
            }
            let store = coordinator.store();
            let current = |lane: Lane| -> Result<Option<NaiveDate>, Box<dyn std::error::Error>> {
                Ok(store.get_placement(&item, lane)?.and_then(|p| p.date))
            };
            let creation = match creation {
                Some(slot) => slot.date(),
                None => current(Lane::Creation)?,
            };
            let publication = match publication {
                Some(slot) => slot.date(),
                None => current(Lane::Publication)?,
            };
            coordinator
                .move_both_lanes(&item, creation, publication)
                .await?;
            if json {
                print_json(&json!({
                    "item_id": item,
                    "creation": creation,
                    "publication": publication,
                }))?;
            } else {
                let show = |d: Option<NaiveDate>| d.map_or("pool".to_string(), |d| d.to_string());
                println!(
                    "{item}: creation {}, publication {}",
                    show(creation),
                    show(publication)
                );
            }
        }
        CalendarAction::List { from, to, lane } => {
            coordinator.load_window(Interval::new(from, to)?).await?;
            let items: Vec<ScheduledItem> = coordinator
                .placements()
                .into_iter()
                .filter(|item| item.is_scheduled())
                .filter(|item| lane.map_or(true, |lane| item.lane == lane))
                .collect();
            print_items(&items, json)?;
        }
        CalendarAction::Pool { lane } => {
            let items = coordinator.store().list_unscheduled(lane).await?;
            print_items(&items, json)?;
        }
        CalendarAction::Generate {
            series,
            first,
            pattern,
            lane,
            creation_lead,
        } => {
            let pattern = pattern.pattern()?;
            let mut template = SeriesTemplate::new(series, lane);
            if let Some(lead) = creation_lead {
                template = template.with_creation_lead(lead);
            }
            let generation = coordinator
                .bulk_generate_from_recurrence(&pattern, &template, first)
                .await?;
            if json {
                print_json(&generation)?;
            } else {
                println!(
                    "series {}: {} placements created, {} failed",
                    generation.series_id,
                    generation.created.len(),
                    generation.failed.len()
                );
                for failure in &generation.failed {
                    println!("  {} {}: {}", failure.occurrence, failure.lane, failure.error);
                }
                if generation.truncated {
                    println!("  (stopped at the occurrence limit)");
                }
            }
            if !generation.failed.is_empty() {
                return Err(format!("{} placements failed", generation.failed.len()).into());
            }
        }
        CalendarAction::Remove { item } => {
            coordinator.remove_entity(&item).await?;
            if json {
                print_json(&json!({ "removed": item }))?;
            } else {
                println!("{item} removed");
            }
        }
    }
    Ok(())
}

fn print_items(items: &[ScheduledItem], json: bool) -> CmdResult {
    if json {
        return print_json(items);
    }
    if items.is_empty() {
        println!("(none)");
    }
    for item in items {
        let date = item.date.map_or("-".to_string(), |d| d.to_string());
        let series = item
            .series_id
            .as_deref()
            .map(|s| format!("  [series {s}]"))
            .unwrap_or_default();
        println!("{date:<10}  {:<11}  {}{series}", item.lane.as_str(), item.item_id);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_parses_pool_and_dates() {
        assert_eq!("pool".parse::<Slot>().unwrap(), Slot::Pool);
        assert_eq!(
            "2024-05-01".parse::<Slot>().unwrap(),
            Slot::Day(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap())
        );
        assert!("tomorrow".parse::<Slot>().is_err());
    }
}
