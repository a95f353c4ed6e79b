//! Per-phase risk advisories.

use serde::{Deserialize, Serialize};

use super::{detect_overlap, Cycle, OverlapResult, RiskWindow, Severity};
use crate::error::ValidationError;
use crate::phases::{PhaseKind, PhaseSet};

/// How loudly an affected phase should be flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisoryLevel {
    None,
    Low,
    Elevated,
    Critical,
}

impl AdvisoryLevel {
    fn for_phase(kind: PhaseKind) -> Self {
        match kind {
            PhaseKind::ActiveWindow => AdvisoryLevel::Critical,
            PhaseKind::PreLaunch => AdvisoryLevel::Elevated,
            PhaseKind::Runway | PhaseKind::PostWindow => AdvisoryLevel::Low,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseAdvisory {
    pub phase: PhaseKind,
    pub is_affected: bool,
    pub overlap: OverlapResult,
    pub level: AdvisoryLevel,
    pub note: String,
}

fn note_for(kind: PhaseKind, overlap: &OverlapResult) -> String {
    if !overlap.overlaps {
        return format!("{kind} is clear of the low-energy window.");
    }

    let extent = match overlap.severity {
        Severity::Full => "most of",
        _ => "part of",
    };
    let days = overlap.overlap_days;
    let plural = if days == 1 { "" } else { "s" };
    let advice = match kind {
        PhaseKind::Runway => {
            "Batch foundational work before the dip or keep tasks light while it lasts."
        }
        PhaseKind::PreLaunch => {
            "Prepare warm-up content ahead of time so promotion keeps running at reduced capacity."
        }
        PhaseKind::ActiveWindow => {
            "Time-sensitive conversion work lands in a low-energy stretch; consider moving the launch."
        }
        PhaseKind::PostWindow => {
            "Follow-up can slip a few days without hurting results; schedule lighter wrap-up tasks."
        }
    };
    format!("{kind} overlaps {extent} the low-energy window ({days} day{plural}). {advice}")
}

/// Run overlap detection for each phase separately.
///
/// Results are in timeline order; overlap in the active window is flagged
/// as critical because it hits the conversion period.
pub fn recommend_per_phase(
    phases: &PhaseSet,
    cycle: Option<&Cycle>,
    window: &RiskWindow,
) -> Result<Vec<PhaseAdvisory>, ValidationError> {
    phases
        .iter()
        .map(|phase| {
            let overlap = detect_overlap(&phase.interval, cycle, window)?;
            let level = if overlap.overlaps {
                AdvisoryLevel::for_phase(phase.kind)
            } else {
                AdvisoryLevel::None
            };
            Ok(PhaseAdvisory {
                phase: phase.kind,
                is_affected: overlap.overlaps,
                note: note_for(phase.kind, &overlap),
                overlap,
                level,
            })
        })
        .collect()
}
