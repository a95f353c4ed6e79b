//! Effort estimate for a phase set.
//!
//! A fixed intensity per phase times a configured hours-per-day rate.

use serde::{Deserialize, Serialize};

use super::{PhaseKind, PhaseSet};
use crate::error::ValidationError;

/// Daily effort level of a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Low,
    Medium,
    High,
}

impl Intensity {
    pub fn for_phase(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::Runway => Intensity::Low,
            PhaseKind::PreLaunch => Intensity::Medium,
            PhaseKind::ActiveWindow => Intensity::High,
            PhaseKind::PostWindow => Intensity::Medium,
        }
    }
}

/// Hours of work per day at each intensity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkloadRates {
    #[serde(default = "default_low")]
    pub low_hours_per_day: f64,
    #[serde(default = "default_medium")]
    pub medium_hours_per_day: f64,
    #[serde(default = "default_high")]
    pub high_hours_per_day: f64,
}

fn default_low() -> f64 {
    1.0
}
fn default_medium() -> f64 {
    2.0
}
fn default_high() -> f64 {
    4.0
}

impl Default for WorkloadRates {
    fn default() -> Self {
        Self {
            low_hours_per_day: default_low(),
            medium_hours_per_day: default_medium(),
            high_hours_per_day: default_high(),
        }
    }
}

impl WorkloadRates {
    pub fn rate(&self, intensity: Intensity) -> f64 {
        match intensity {
            Intensity::Low => self.low_hours_per_day,
            Intensity::Medium => self.medium_hours_per_day,
            Intensity::High => self.high_hours_per_day,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        for (field, value) in [
            ("workload.low_hours_per_day", self.low_hours_per_day),
            ("workload.medium_hours_per_day", self.medium_hours_per_day),
            ("workload.high_hours_per_day", self.high_hours_per_day),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ValidationError::invalid_value(
                    field,
                    format!("expected a non-negative number of hours, got {value}"),
                ));
            }
        }
        Ok(())
    }
}

/// Effort for one phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseLoad {
    pub phase: PhaseKind,
    pub intensity: Intensity,
    pub days: i64,
    pub hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadEstimate {
    pub total_days: i64,
    pub total_hours: f64,
    pub per_phase: Vec<PhaseLoad>,
}

/// Estimate total effort for a phase set.
pub fn estimate_workload(phases: &PhaseSet, rates: &WorkloadRates) -> WorkloadEstimate {
    let per_phase: Vec<PhaseLoad> = phases
        .iter()
        .map(|phase| {
            let intensity = Intensity::for_phase(phase.kind);
            let days = phase.interval.len_days();
            PhaseLoad {
                phase: phase.kind,
                intensity,
                days,
                hours: days as f64 * rates.rate(intensity),
            }
        })
        .collect();

    WorkloadEstimate {
        total_days: per_phase.iter().map(|p| p.days).sum(),
        total_hours: per_phase.iter().map(|p| p.hours).sum(),
        per_phase,
    }
}
