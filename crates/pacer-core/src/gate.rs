//! Sequencing between the tiered family and the dependent families.
//!
//! The tiered family's primary and secondary batches start at once and never
//! wait on each other. Each dependent family waits until the tracker reports
//! primary headroom, then runs to completion before the next one waits.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::event::{Category, CategoryHints};
use crate::job::{Family, JobEntry, JobRunner};
use crate::policy::ConcurrencyPolicy;
use crate::scheduler::{FamilyOutcome, LaunchScheduler, RunHandle};
use crate::tracker::{EventSink, Headroom, InflightTracker};

/// Handles for the tiered family's two category batches.
#[derive(Debug)]
pub struct TieredHandles {
    pub primary: RunHandle,
    pub secondary: RunHandle,
}

/// A dependent family ready to be admitted through the gate.
#[derive(Debug, Clone)]
pub struct DependentFamily {
    pub family: Family,
    pub jobs: Vec<JobEntry>,
    pub policy: ConcurrencyPolicy,
}

#[derive(Debug, Clone)]
pub struct DependencyGate {
    tracker: Arc<InflightTracker>,
    low_watermark: Option<usize>,
    poll_interval: Duration,
}

impl DependencyGate {
    pub fn new(
        tracker: Arc<InflightTracker>,
        low_watermark: Option<usize>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            tracker,
            low_watermark,
            poll_interval,
        }
    }

    pub fn tracker(&self) -> &Arc<InflightTracker> {
        &self.tracker
    }

    /// Start both tiered batches in the background. Each batch gets its own
    /// permit pool under the same policy.
    pub fn launch_tiered(
        &self,
        scheduler: &LaunchScheduler,
        primary: Vec<JobEntry>,
        secondary: Vec<JobEntry>,
        policy: ConcurrencyPolicy,
        runner: Arc<dyn JobRunner>,
        sink: EventSink,
    ) -> TieredHandles {
        let spawn_batch = |category: Category, jobs: Vec<JobEntry>| {
            let scheduler = scheduler.clone();
            let runner = Arc::clone(&runner);
            let sink = sink.clone();
            RunHandle::spawn(Family::Tiered, Some(category), async move {
                scheduler
                    .run_family(Family::Tiered, Some(category), jobs, &policy, runner, sink)
                    .await
            })
        };
        TieredHandles {
            primary: spawn_batch(Category::Primary, primary),
            secondary: spawn_batch(Category::Secondary, secondary),
        }
    }

    /// Poll the tracker until headroom is ready. Unbounded: a caller that
    /// needs a deadline wraps this (or the whole unit) in its own timeout.
    pub async fn wait_for_headroom(&self) -> Headroom {
        let started = Instant::now();
        let mut polls: u64 = 0;
        loop {
            let headroom = self.tracker.headroom(self.low_watermark);
            if headroom.ready {
                if polls > 0 {
                    tracing::info!(
                        waited_secs = started.elapsed().as_secs_f64(),
                        effective_max = headroom.effective_max,
                        primary_inflight = headroom.primary_inflight,
                        "headroom available"
                    );
                }
                return headroom;
            }
            if polls == 0 {
                tracing::info!(
                    effective_max = headroom.effective_max,
                    primary_inflight = headroom.primary_inflight,
                    low_watermark = ?self.low_watermark,
                    "waiting for primary headroom"
                );
            } else {
                tracing::debug!(
                    polls,
                    available = headroom.available,
                    primary_inflight = headroom.primary_inflight,
                    "still waiting for headroom"
                );
            }
            polls += 1;
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Run dependent families one after another, each behind a headroom wait.
    /// Families with no jobs are skipped without waiting.
    pub async fn run_dependents(
        &self,
        scheduler: &LaunchScheduler,
        families: Vec<DependentFamily>,
        runner: Arc<dyn JobRunner>,
        hints: Arc<CategoryHints>,
    ) -> Vec<FamilyOutcome> {
        let mut outcomes = Vec::with_capacity(families.len());
        for dependent in families {
            if dependent.jobs.is_empty() {
                tracing::debug!(family = %dependent.family, "no jobs; skipping gate");
                continue;
            }
            self.wait_for_headroom().await;
            let sink = EventSink::detached(Arc::clone(&hints), dependent.family);
            let outcome = scheduler
                .run_family(
                    dependent.family,
                    None,
                    dependent.jobs,
                    &dependent.policy,
                    Arc::clone(&runner),
                    sink,
                )
                .await;
            outcomes.push(outcome);
        }
        outcomes
    }
}
