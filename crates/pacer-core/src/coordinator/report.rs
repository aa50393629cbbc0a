//! What a unit run hands back to the caller.

use std::time::Duration;

use serde::Serialize;

use crate::job::Family;
use crate::scheduler::{FamilyOutcome, FamilySummary, JobFailure, JobSuccess, RunHandle};
use crate::tracker::TrackerSnapshot;

/// State of the tiered family's secondary batch when the unit returned.
#[derive(Debug)]
pub enum SecondaryBatch {
    /// The unit had no secondary jobs.
    Empty,
    Awaited(FamilyOutcome),
    /// Still running; join the handle to collect it.
    Detached(RunHandle),
}

impl SecondaryBatch {
    pub fn outcome(&self) -> Option<&FamilyOutcome> {
        match self {
            SecondaryBatch::Awaited(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn is_detached(&self) -> bool {
        matches!(self, SecondaryBatch::Detached(_))
    }
}

#[derive(Debug)]
pub struct UnitReport {
    pub unit: String,
    pub elapsed: Duration,
    /// Non-empty outcomes: tiered primary, independent, then the dependents.
    pub families: Vec<FamilyOutcome>,
    pub secondary: SecondaryBatch,
    /// Tracker state when the unit returned.
    pub tracker: TrackerSnapshot,
    pub heartbeats: u64,
}

impl UnitReport {
    fn outcomes(&self) -> impl Iterator<Item = &FamilyOutcome> {
        self.families.iter().chain(self.secondary.outcome())
    }

    pub fn successes(&self) -> impl Iterator<Item = &JobSuccess> {
        self.outcomes().flat_map(|o| o.successes.iter())
    }

    pub fn failures(&self) -> impl Iterator<Item = &JobFailure> {
        self.outcomes().flat_map(|o| o.failures.iter())
    }

    pub fn family(&self, family: Family) -> Option<&FamilyOutcome> {
        self.families.iter().find(|o| o.family == family)
    }

    /// Wait for a detached secondary batch and fold it into the report.
    pub async fn finish_secondary(&mut self) {
        let batch = std::mem::replace(&mut self.secondary, SecondaryBatch::Empty);
        self.secondary = match batch {
            SecondaryBatch::Detached(handle) => {
                tracing::info!(unit = %self.unit, "waiting for secondary batch");
                SecondaryBatch::Awaited(handle.join().await)
            }
            other => other,
        };
    }

    pub fn summary(&self) -> UnitSummary {
        let families: Vec<FamilySummary> = self.outcomes().map(FamilyOutcome::summary).collect();
        UnitSummary {
            unit: self.unit.clone(),
            elapsed_secs: self.elapsed.as_secs_f64(),
            succeeded: families.iter().map(|f| f.succeeded.len()).sum(),
            failed: families.iter().map(|f| f.failed.len()).sum(),
            secondary_pending: self.secondary.is_detached(),
            families,
            tracker: self.tracker.clone(),
        }
    }
}

/// Serializable report for the evaluation stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnitSummary {
    pub unit: String,
    pub elapsed_secs: f64,
    pub succeeded: usize,
    pub failed: usize,
    pub secondary_pending: bool,
    pub families: Vec<FamilySummary>,
    pub tracker: TrackerSnapshot,
}
