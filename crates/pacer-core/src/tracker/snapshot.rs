//! Serializable copy of tracker state for reports.

use serde::Serialize;

use crate::event::CategoryCounts;

use super::InflightState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrackerSnapshot {
    pub totals: CategoryCounts,
    pub inflight: CategoryCounts,
    pub completed: CategoryCounts,
    /// Ceiling in effect (advertised, or the default heuristic).
    pub effective_max: usize,
    /// True once any advertisement has been applied.
    pub advertised: bool,
}

impl TrackerSnapshot {
    pub(super) fn from_state(state: &InflightState) -> Self {
        Self {
            totals: state.totals,
            inflight: state.inflight,
            completed: state.completed,
            effective_max: state.effective_max(),
            advertised: state.effective_max.is_some(),
        }
    }
}
