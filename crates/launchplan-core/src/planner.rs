//! One-call launch planning.
//!
//! Runs the phase → risk → adjusted-phase loop: suggest phases for an
//! anchor, check each phase against the low-energy window, and when the
//! anchor itself is at risk recompute the phases around the suggested
//! anchor.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ValidationError;
use crate::phases::{
    estimate_workload, DurationCategory, PhaseRules, PhaseSet, WorkloadEstimate, WorkloadRates,
};
use crate::risk::{
    recommend_per_phase, suggest_adjustment, AdjustmentSuggestion, Cycle, PhaseAdvisory,
    RiskWindow,
};

/// Inputs shared by every planning call.
#[derive(Debug, Clone, Default)]
pub struct PlanningRules {
    pub phases: PhaseRules,
    pub workload: WorkloadRates,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub anchor: NaiveDate,
    pub category: DurationCategory,
    pub phases: PhaseSet,
    pub advisories: Vec<PhaseAdvisory>,
    pub workload: WorkloadEstimate,
    pub adjustment: Option<AdjustmentSuggestion>,
    /// Phases recomputed around the suggested anchor.
    pub adjusted_phases: Option<PhaseSet>,
    pub adjusted_advisories: Option<Vec<PhaseAdvisory>>,
}

impl LaunchPlan {
    /// Whether any phase of the suggested plan touches the risk window.
    pub fn has_risk(&self) -> bool {
        self.advisories.iter().any(|a| a.is_affected)
    }
}

/// Build a launch plan for an anchor date.
///
/// `close` overrides the category's active-window length; it is needed for
/// custom categories.
pub fn plan_launch(
    rules: &PlanningRules,
    anchor: NaiveDate,
    close: Option<NaiveDate>,
    category: &DurationCategory,
    cycle: Option<&Cycle>,
    window: &RiskWindow,
) -> Result<LaunchPlan, ValidationError> {
    let phases = match close {
        Some(close) => rules.phases.compute_with_close(anchor, close, category)?,
        None => rules.phases.compute_suggested(anchor, category),
    };
    let advisories = recommend_per_phase(&phases, cycle, window)?;
    let workload = estimate_workload(&phases, &rules.workload);
    let adjustment = suggest_adjustment(anchor, cycle, window)?;

    let (adjusted_phases, adjusted_advisories) = match adjustment {
        Some(suggestion) => {
            let moved = phases.reanchored(suggestion.suggested_date);
            let moved_advisories = recommend_per_phase(&moved, cycle, window)?;
            info!(
                %anchor,
                suggested = %suggestion.suggested_date,
                shift_days = suggestion.shift_days,
                "launch anchor adjusted away from risk window"
            );
            (Some(moved), Some(moved_advisories))
        }
        None => (None, None),
    };

    Ok(LaunchPlan {
        anchor,
        category: category.clone(),
        phases,
        advisories,
        workload,
        adjustment,
        adjusted_phases,
        adjusted_advisories,
    })
}
