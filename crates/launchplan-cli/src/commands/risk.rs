use chrono::NaiveDate;
use clap::Subcommand;
use launchplan_core::{detect_overlap, recommend_per_phase, suggest_adjustment, Config, Interval};

use super::{label, print_json, CmdResult, CycleArgs, LaunchArgs};

#[derive(Subcommand)]
pub enum RiskAction {
    /// Check a date range against the risk window
    Check {
        /// First day of the range
        start: NaiveDate,
        /// Last day of the range (inclusive)
        end: NaiveDate,
        #[command(flatten)]
        cycle: CycleArgs,
    },
    /// Suggest the nearest anchor outside the risk window
    Adjust {
        /// Proposed launch date
        anchor: NaiveDate,
        #[command(flatten)]
        cycle: CycleArgs,
    },
    /// Per-phase advisories for a launch
    Phases {
        #[command(flatten)]
        launch: LaunchArgs,
        #[command(flatten)]
        cycle: CycleArgs,
    },
}

pub fn run(action: RiskAction, json: bool) -> CmdResult {
    let config = Config::load_or_default();
    match action {
        RiskAction::Check { start, end, cycle } => {
            let (cycle, window) = cycle.resolve(&config)?;
            let interval = Interval::new(start, end)?;
            let result = detect_overlap(&interval, cycle.as_ref(), &window)?;
            if json {
                print_json(&result)?;
            } else if result.overlaps {
                println!(
                    "overlaps '{}' for {} days ({})",
                    window.id,
                    result.overlap_days,
                    label(&result.severity)
                );
            } else {
                println!("clear of '{}'", window.id);
            }
        }
        RiskAction::Adjust { anchor, cycle } => {
            let (cycle, window) = cycle.resolve(&config)?;
            let suggestion = suggest_adjustment(anchor, cycle.as_ref(), &window)?;
            if json {
                print_json(&suggestion)?;
            } else {
                match suggestion {
                    Some(s) => println!(
                        "move {} to {} ({:+} days, {})",
                        s.original_date,
                        s.suggested_date,
                        s.shift_days,
                        label(&s.direction)
                    ),
                    None => println!("{anchor} is outside '{}'; no change needed", window.id),
                }
            }
        }
        RiskAction::Phases { launch, cycle } => {
            let (cycle, window) = cycle.resolve(&config)?;
            let phases = launch.phases(&config.phases)?;
            let advisories = recommend_per_phase(&phases, cycle.as_ref(), &window)?;
            if json {
                print_json(&advisories)?;
            } else {
                for advisory in &advisories {
                    println!("[{}] {}", label(&advisory.level), advisory.note);
                }
            }
        }
    }
    Ok(())
}
