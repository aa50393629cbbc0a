//! Registry of active runs, read by the heartbeat.
//!
//! Each launched job is registered under a synthetic run id and removed by
//! its [`RunGuard`] when the job's task finishes for any reason.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tokio::time::Instant;

use crate::job::Family;

use super::guard::RunGuard;

/// Synthetic id for one launched job, e.g. `tiered#3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunId {
    pub family: Family,
    pub seq: u64,
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.family, self.seq)
    }
}

#[derive(Debug, Clone)]
pub struct ActiveRun {
    pub run_id: RunId,
    pub job_id: String,
    pub started_at: Instant,
}

#[derive(Debug, Default)]
pub struct RunRegistry {
    runs: RwLock<HashMap<RunId, ActiveRun>>,
    next_seq: AtomicU64,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a job that is about to start. Dropping the guard deregisters it.
    pub fn register(self: &Arc<Self>, family: Family, job_id: &str) -> RunGuard {
        let run_id = RunId {
            family,
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed) + 1,
        };
        let run = ActiveRun {
            run_id,
            job_id: job_id.to_string(),
            started_at: Instant::now(),
        };
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(run_id, run);
        RunGuard::new(Arc::clone(self), run_id)
    }

    pub(super) fn deregister(&self, run_id: RunId) {
        self.runs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&run_id);
    }

    /// Active runs, oldest first.
    pub fn active(&self) -> Vec<ActiveRun> {
        let mut runs: Vec<ActiveRun> = self
            .runs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        runs.sort_by_key(|r| (r.started_at, r.run_id));
        runs
    }

    pub fn len(&self) -> usize {
        self.runs.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
