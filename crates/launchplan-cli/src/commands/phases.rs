use clap::Subcommand;
use launchplan_core::{estimate_workload, Config};

use super::{label, print_json, print_phases, CmdResult, LaunchArgs};

#[derive(Subcommand)]
pub enum PhasesAction {
    /// Suggest phase dates for a launch
    Suggest {
        #[command(flatten)]
        launch: LaunchArgs,
    },
    /// Estimate hours of work per phase
    Workload {
        #[command(flatten)]
        launch: LaunchArgs,
    },
}

pub fn run(action: PhasesAction, json: bool) -> CmdResult {
    let config = Config::load_or_default();
    match action {
        PhasesAction::Suggest { launch } => {
            let phases = launch.phases(&config.phases)?;
            if json {
                print_json(&phases)?;
            } else {
                print_phases(&phases);
            }
        }
        PhasesAction::Workload { launch } => {
            let phases = launch.phases(&config.phases)?;
            let estimate = estimate_workload(&phases, &config.workload);
            if json {
                print_json(&estimate)?;
            } else {
                for load in &estimate.per_phase {
                    println!(
                        "{:<14} {:>3} days  {:<6}  {:>6.1} h",
                        load.phase.label(),
                        load.days,
                        label(&load.intensity),
                        load.hours
                    );
                }
                println!(
                    "{:<14} {:>3} days          {:>6.1} h",
                    "total", estimate.total_days, estimate.total_hours
                );
            }
        }
    }
    Ok(())
}
