use clap::Args;
use launchplan_core::{plan_launch, Config};

use super::{label, print_json, print_phases, CmdResult, CycleArgs, LaunchArgs};

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    launch: LaunchArgs,
    #[command(flatten)]
    cycle: CycleArgs,
}

pub fn run(args: PlanArgs, json: bool) -> CmdResult {
    let config = Config::load_or_default();
    let (cycle, window) = args.cycle.resolve(&config)?;
    // Custom categories are rejected here before planning.
    args.launch.phases(&config.phases)?;

    let plan = plan_launch(
        &config.planning_rules(),
        args.launch.anchor,
        args.launch.close,
        &args.launch.category,
        cycle.as_ref(),
        &window,
    )?;

    if json {
        return print_json(&plan);
    }

    println!("Launch {} ({})", plan.anchor, plan.category);
    print_phases(&plan.phases);
    println!(
        "Workload: {} days, {:.1} h",
        plan.workload.total_days, plan.workload.total_hours
    );
    for advisory in plan.advisories.iter().filter(|a| a.is_affected) {
        println!("[{}] {}", label(&advisory.level), advisory.note);
    }
    if let (Some(adjustment), Some(moved)) = (&plan.adjustment, &plan.adjusted_phases) {
        println!(
            "Suggested anchor: {} ({:+} days)",
            adjustment.suggested_date, adjustment.shift_days
        );
        print_phases(moved);
    }
    Ok(())
}
