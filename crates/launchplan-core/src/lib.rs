//! # Launchplan Core Library
//!
//! This library provides the date-based planning and scheduling logic for
//! launch campaigns and recurring content. Every operation is available
//! through the `launchplan-cli` binary, which is a thin layer over this
//! crate.
//!
//! ## Architecture
//!
//! - **Interval math**: closed date ranges and calendar-day arithmetic
//! - **Phases**: four-phase launch timelines derived from an anchor date,
//!   plus workload estimates per phase
//! - **Risk**: overlap of timelines with a recurring low-energy window,
//!   adjustment suggestions and per-phase advisories
//! - **Recurrence**: expansion of weekly, biweekly and monthly patterns into
//!   concrete dates
//! - **Schedule**: the single writer for two-lane calendar placements, with
//!   per-item ordering and retry of failed writes
//! - **Storage**: SQLite placement store and TOML configuration
//!
//! ## Key Components
//!
//! - [`PhaseRules`]: Phase length table per duration category
//! - [`plan_launch`]: Phase, risk and adjustment in one call
//! - [`expand`]: Recurrence expansion with an occurrence cap
//! - [`ScheduleCoordinator`]: Placement writes and local calendar view
//! - [`PlacementDb`]: SQLite-backed [`PlacementStore`]
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod interval;
pub mod phases;
pub mod planner;
pub mod recurrence;
pub mod risk;
pub mod schedule;
pub mod storage;

pub use error::{
    AssignError, ConfigError, CoreError, DatabaseError, Result, StoreError, ValidationError,
};
pub use events::PlacementEvent;
pub use interval::Interval;
pub use phases::{
    compute_suggested, compute_with_close, estimate_workload, DurationCategory, PhaseKind,
    PhaseRules, PhaseSet, WorkloadEstimate, WorkloadRates,
};
pub use planner::{plan_launch, LaunchPlan, PlanningRules};
pub use recurrence::{describe, expand, Expansion, Frequency, RecurrencePattern, Termination};
pub use risk::{
    detect_overlap, recommend_per_phase, suggest_adjustment, AdjustmentSuggestion, Cycle,
    OverlapResult, PhaseAdvisory, RiskWindow, Severity,
};
pub use schedule::{
    BulkGeneration, InMemoryStore, Lane, PlacementStore, ScheduleCoordinator, ScheduledItem,
    SeriesTemplate,
};
pub use storage::{Config, PlacementDb};
