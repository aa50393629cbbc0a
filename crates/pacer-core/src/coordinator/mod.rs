//! Top-level driver for one unit of work.
//!
//! Loads the unit's jobs, groups them by family, and wires a fresh tracker,
//! registry and gate for the unit:
//!
//! 1. tiered primary and secondary batches start immediately,
//! 2. the independent family starts immediately,
//! 3. the two dependent families go through the gate in order,
//! 4. everything is awaited except, optionally, the secondary batch.
//!
//! A heartbeat logs progress for as long as the unit runs.

mod classify;
mod heartbeat;
mod report;

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::config::{ConcurrencyConfig, PacerConfig};
use crate::error::PacerError;
use crate::event::{Category, CategoryHints};
use crate::gate::{DependencyGate, DependentFamily};
use crate::job::{Family, JobRunner, JobSource};
use crate::policy;
use crate::scheduler::{LaunchScheduler, RunHandle, RunRegistry};
use crate::tracker::{EventSink, InflightTracker};

pub use classify::{classify, FamilyPlan};
pub use heartbeat::{format_elapsed, heartbeat_lines, Heartbeat};
pub use report::{SecondaryBatch, UnitReport, UnitSummary};

/// Knobs the coordinator takes from [`PacerConfig`].
#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    pub heartbeat_interval: Duration,
    pub poll_interval: Duration,
    pub low_watermark: Option<usize>,
    pub await_secondary: bool,
    pub hints: CategoryHints,
}

impl CoordinatorSettings {
    pub fn from_config(cfg: &PacerConfig) -> Self {
        Self {
            heartbeat_interval: cfg.heartbeat_interval(),
            poll_interval: cfg.headroom_poll_interval(),
            low_watermark: cfg.low_watermark,
            await_secondary: cfg.await_secondary,
            hints: cfg.hints.clone(),
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from_config(&PacerConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct RunCoordinator {
    settings: CoordinatorSettings,
    concurrency: ConcurrencyConfig,
}

impl RunCoordinator {
    pub fn new(settings: CoordinatorSettings, concurrency: ConcurrencyConfig) -> Self {
        Self {
            settings,
            concurrency,
        }
    }

    pub fn from_config(cfg: &PacerConfig) -> Self {
        Self::new(CoordinatorSettings::from_config(cfg), cfg.concurrency.clone())
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    /// Run every job of `unit`. Only a failure to load the job list is an
    /// error; job failures come back inside the report.
    pub async fn run_unit<S>(
        &self,
        unit: &str,
        source: &S,
        runner: Arc<dyn JobRunner>,
    ) -> Result<UnitReport, PacerError>
    where
        S: JobSource + ?Sized,
    {
        let jobs = source.load_jobs().map_err(|e| PacerError::LoadJobs {
            unit: unit.to_string(),
            reason: format!("{e:#}"),
        })?;
        let started = Instant::now();
        let hints = Arc::new(self.settings.hints.clone());
        let plan = classify(jobs, &hints);
        tracing::info!(
            unit,
            jobs = plan.len(),
            primary = plan.primary.len(),
            secondary = plan.secondary.len(),
            independent = plan.independent.len(),
            first_dependent = plan.first_dependent.len(),
            second_dependent = plan.second_dependent.len(),
            "starting unit"
        );

        let tracker = Arc::new(InflightTracker::new(plan.totals, None));
        let registry = Arc::new(RunRegistry::new());
        let scheduler = LaunchScheduler::new(Arc::clone(&registry));
        let gate = DependencyGate::new(
            Arc::clone(&tracker),
            self.settings.low_watermark,
            self.settings.poll_interval,
        );
        let heartbeat = Heartbeat::start(
            unit.to_string(),
            started,
            Arc::clone(&registry),
            self.settings.heartbeat_interval,
        );

        let has_secondary = !plan.secondary.is_empty();
        let tiered = gate.launch_tiered(
            &scheduler,
            plan.primary,
            plan.secondary,
            policy::resolve(&self.concurrency, Family::Tiered),
            Arc::clone(&runner),
            EventSink::attached(Arc::clone(&tracker), Arc::clone(&hints), Family::Tiered),
        );

        let independent = {
            let scheduler = scheduler.clone();
            let runner = Arc::clone(&runner);
            let sink = EventSink::detached(Arc::clone(&hints), Family::Independent);
            let policy = policy::resolve(&self.concurrency, Family::Independent);
            let jobs = plan.independent;
            RunHandle::spawn(Family::Independent, None, async move {
                scheduler
                    .run_family(Family::Independent, None, jobs, &policy, runner, sink)
                    .await
            })
        };

        let dependents = vec![
            DependentFamily {
                family: Family::FirstDependent,
                jobs: plan.first_dependent,
                policy: policy::resolve(&self.concurrency, Family::FirstDependent),
            },
            DependentFamily {
                family: Family::SecondDependent,
                jobs: plan.second_dependent,
                policy: policy::resolve(&self.concurrency, Family::SecondDependent),
            },
        ];
        let dependent_outcomes = gate
            .run_dependents(&scheduler, dependents, Arc::clone(&runner), Arc::clone(&hints))
            .await;

        let mut families = vec![tiered.primary.join().await, independent.join().await];
        families.extend(dependent_outcomes);
        families.retain(|outcome| !outcome.is_empty());

        let secondary = if !has_secondary {
            // Nothing was queued; the task is already done or about to be.
            drop(tiered.secondary);
            SecondaryBatch::Empty
        } else if self.settings.await_secondary {
            SecondaryBatch::Awaited(tiered.secondary.join().await)
        } else {
            tracing::info!(
                unit,
                category = %Category::Secondary,
                "leaving secondary batch running"
            );
            SecondaryBatch::Detached(tiered.secondary)
        };

        let heartbeats = heartbeat.stop().await;
        let report = UnitReport {
            unit: unit.to_string(),
            elapsed: started.elapsed(),
            families,
            secondary,
            tracker: tracker.snapshot(),
            heartbeats,
        };
        tracing::info!(
            unit,
            elapsed = %format_elapsed(report.elapsed),
            succeeded = report.successes().count(),
            failed = report.failures().count(),
            secondary_pending = report.secondary.is_detached(),
            "unit finished"
        );
        Ok(report)
    }
}
