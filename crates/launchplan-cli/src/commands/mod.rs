//! Subcommand implementations and the argument types they share.

pub mod calendar;
pub mod config;
pub mod phases;
pub mod plan;
pub mod recur;
pub mod risk;

use std::error::Error;

use chrono::NaiveDate;
use clap::Args;
use launchplan_core::recurrence::parse_weekdays;
use launchplan_core::{
    Config, Cycle, DurationCategory, Frequency, PhaseRules, PhaseSet, RecurrencePattern,
    RiskWindow, Termination, ValidationError,
};
use serde::Serialize;

pub(crate) type CmdResult = Result<(), Box<dyn Error>>;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Serialized name of a unit enum variant, e.g. `partial`.
pub(crate) fn label<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

pub(crate) fn print_phases(phases: &PhaseSet) {
    for phase in phases.iter() {
        println!(
            "{:<14} {}  ({} days)",
            phase.kind.label(),
            phase.interval,
            phase.interval.len_days()
        );
    }
}

/// Anchor, category and optional close date.
#[derive(Args, Debug, Clone)]
pub struct LaunchArgs {
    /// Active window open date (YYYY-MM-DD)
    pub anchor: NaiveDate,
    /// Duration category: short, standard, extended, or a custom name
    #[arg(long, default_value = "standard")]
    pub category: DurationCategory,
    /// Active window close date; required for custom categories
    #[arg(long)]
    pub close: Option<NaiveDate>,
}

impl LaunchArgs {
    pub fn phases(&self, rules: &PhaseRules) -> Result<PhaseSet, ValidationError> {
        match self.close {
            Some(close) => rules.compute_with_close(self.anchor, close, &self.category),
            None if self.category.requires_close_date() => Err(ValidationError::InvalidValue {
                field: "close".into(),
                message: format!("category '{}' needs an explicit --close date", self.category),
            }),
            None => Ok(rules.compute_suggested(self.anchor, &self.category)),
        }
    }
}

/// Risk window offsets written as `START-END`, e.g. `76-90`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSpec {
    pub start: u32,
    pub end: u32,
}

impl std::str::FromStr for WindowSpec {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = s
            .split_once('-')
            .ok_or_else(|| format!("expected START-END, got '{s}'"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid day offset '{v}': {e}"))
        };
        Ok(Self {
            start: parse(start)?,
            end: parse(end)?,
        })
    }
}

/// Cycle overrides; unset values come from the `[cycle]` config section.
#[derive(Args, Debug, Clone, Default)]
pub struct CycleArgs {
    /// First day of the current cycle
    #[arg(long)]
    pub cycle_start: Option<NaiveDate>,
    /// Cycle length in days
    #[arg(long)]
    pub cycle_length: Option<u32>,
    /// Risk window day offsets, e.g. 76-90
    #[arg(long)]
    pub window: Option<WindowSpec>,
    /// Ignore any configured cycle
    #[arg(long, conflicts_with = "cycle_start")]
    pub no_cycle: bool,
}

impl CycleArgs {
    pub fn resolve(&self, config: &Config) -> Result<(Option<Cycle>, RiskWindow), ValidationError> {
        let window = match self.window {
            Some(spec) => RiskWindow::new(config.cycle.risk_window.id.clone(), spec.start, spec.end),
            None => config.cycle.risk_window.clone(),
        };
        if self.no_cycle {
            return Ok((None, window));
        }

        let length = self.cycle_length.unwrap_or(config.cycle.length_days);
        let cycle = self
            .cycle_start
            .or(config.cycle.start_date)
            .map(|start| Cycle::new(start, length))
            .transpose()?;
        Ok((cycle, window))
    }
}

/// Recurrence pattern flags.
#[derive(Args, Debug, Clone)]
pub struct PatternArgs {
    /// weekly, biweekly, monthly or other
    #[arg(long, default_value = "weekly")]
    pub frequency: Frequency,
    /// Comma-separated weekdays, names or numbers (0 = Sunday)
    #[arg(long)]
    pub weekdays: Option<String>,
    /// Day of month for monthly patterns (1-31)
    #[arg(long)]
    pub month_day: Option<u32>,
    /// Last allowed occurrence date
    #[arg(long, conflicts_with = "count")]
    pub until: Option<NaiveDate>,
    /// Number of occurrences including the first
    #[arg(long)]
    pub count: Option<u32>,
}

impl PatternArgs {
    pub fn pattern(&self) -> Result<RecurrencePattern, ValidationError> {
        let termination = match (self.until, self.count) {
            (Some(date), _) => Termination::OnDate { date },
            (None, Some(count)) => Termination::AfterCount { count },
            (None, None) => Termination::Never,
        };
        let weekdays = match &self.weekdays {
            Some(list) => parse_weekdays(list)?,
            None => Default::default(),
        };
        let pattern = RecurrencePattern {
            frequency: self.frequency,
            weekdays,
            month_day: self.month_day,
            termination,
        };
        pattern.validate()?;
        Ok(pattern)
    }
}
