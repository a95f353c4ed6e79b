//! Minimal-shift suggestions for anchors that land inside a risk window.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Cycle, RiskWindow};
use crate::error::ValidationError;
use crate::interval::{add_days, days_between};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShiftDirection {
    Earlier,
    Later,
}

/// Advisory move of an anchor date out of a risk window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentSuggestion {
    pub original_date: NaiveDate,
    pub suggested_date: NaiveDate,
    /// Signed day count: negative moves earlier.
    pub shift_days: i64,
    pub direction: ShiftDirection,
}

/// Suggest the smallest move that takes `anchor` out of the risk window.
///
/// Returns `None` when there is no cycle or the anchor is already outside
/// the window. Ties prefer moving later.
pub fn suggest_adjustment(
    anchor: NaiveDate,
    cycle: Option<&Cycle>,
    window: &RiskWindow,
) -> Result<Option<AdjustmentSuggestion>, ValidationError> {
    let Some(cycle) = cycle else {
        return Ok(None);
    };
    let absolute = window.absolute(cycle)?;
    if !absolute.contains(anchor) {
        return Ok(None);
    }

    let earlier = add_days(absolute.start, -1);
    let later = add_days(absolute.end, 1);
    let earlier_days = days_between(earlier, anchor);
    let later_days = days_between(anchor, later);

    let suggestion = if earlier_days < later_days {
        AdjustmentSuggestion {
            original_date: anchor,
            suggested_date: earlier,
            shift_days: -earlier_days,
            direction: ShiftDirection::Earlier,
        }
    } else {
        AdjustmentSuggestion {
            original_date: anchor,
            suggested_date: later,
            shift_days: later_days,
            direction: ShiftDirection::Later,
        }
    };

    debug!(
        window = %window.id,
        %anchor,
        suggested = %suggestion.suggested_date,
        shift_days = suggestion.shift_days,
        "anchor falls inside risk window"
    );
    Ok(Some(suggestion))
}
