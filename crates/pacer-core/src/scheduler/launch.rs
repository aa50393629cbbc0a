//! Run one family's jobs under its concurrency policy.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{AcquireError, OwnedSemaphorePermit};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::JobError;
use crate::event::Category;
use crate::job::{Family, JobEntry, JobOutput, JobRunner};
use crate::policy::ConcurrencyPolicy;
use crate::tracker::EventSink;

use super::outcome::{FamilyOutcome, JobFailure, JobSuccess};
use super::pool::PacedPermitPool;
use super::registry::{RunId, RunRegistry};

type Timed = (Duration, Result<JobOutput, JobError>);

/// Launches a family's jobs and collects their outcomes. Cheap to clone; all
/// clones share one run registry.
#[derive(Debug, Clone)]
pub struct LaunchScheduler {
    registry: Arc<RunRegistry>,
}

/// A job whose task has been spawned.
struct Launched {
    job: JobEntry,
    run_id: RunId,
    started_at: Instant,
    handle: JoinHandle<Timed>,
}

impl LaunchScheduler {
    pub fn new(registry: Arc<RunRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<RunRegistry> {
        &self.registry
    }

    /// Run `jobs` to completion under `policy`.
    ///
    /// Disabled policy: one job at a time, in input order. Enabled: at most
    /// `max_concurrency` at once. Either way launches are spaced by
    /// `launch_delay_seconds`.
    /// A failing job never stops its siblings; successes and failures come
    /// back in input order.
    pub async fn run_family(
        &self,
        family: Family,
        category: Option<Category>,
        jobs: Vec<JobEntry>,
        policy: &ConcurrencyPolicy,
        runner: Arc<dyn JobRunner>,
        sink: EventSink,
    ) -> FamilyOutcome {
        let mut outcome = FamilyOutcome::new(family, category);
        if jobs.is_empty() {
            return outcome;
        }
        tracing::info!(
            family = %outcome.label(),
            jobs = jobs.len(),
            enabled = policy.enabled,
            max_concurrency = policy.max_concurrency,
            launch_delay_secs = policy.launch_delay_seconds,
            "starting family"
        );

        let pool = PacedPermitPool::from_policy(policy);
        if policy.enabled {
            let mut launched = Vec::with_capacity(jobs.len());
            for job in jobs {
                match pool.acquire().await {
                    Ok(permit) => {
                        launched.push(Ok(self.launch(family, job, &runner, &sink, Some(permit))));
                    }
                    Err(e) => launched.push(Err(no_permit(job, e))),
                }
            }
            for entry in launched {
                let result = match entry {
                    Ok(launched) => launched.finish().await,
                    Err(failure) => Err(failure),
                };
                record(&mut outcome, result);
            }
        } else {
            for job in jobs {
                let result = match pool.acquire().await {
                    Ok(permit) => self.launch(family, job, &runner, &sink, Some(permit)).finish().await,
                    Err(e) => Err(no_permit(job, e)),
                };
                record(&mut outcome, result);
            }
        }

        tracing::info!(
            family = %outcome.label(),
            succeeded = outcome.successes.len(),
            failed = outcome.failures.len(),
            "family finished"
        );
        outcome
    }

    fn launch(
        &self,
        family: Family,
        job: JobEntry,
        runner: &Arc<dyn JobRunner>,
        sink: &EventSink,
        permit: Option<OwnedSemaphorePermit>,
    ) -> Launched {
        let guard = self.registry.register(family, &job.id);
        let run_id = guard.run_id();
        tracing::info!(
            run_id = %run_id,
            job = %job.id,
            provider = %job.provider,
            model = %job.model,
            "launching job"
        );
        let work = runner.launch(job.clone(), sink.clone());
        let started_at = Instant::now();
        let handle = tokio::spawn(async move {
            let _guard = guard;
            let _permit = permit;
            let started = Instant::now();
            let result = work.await;
            (started.elapsed(), result)
        });
        Launched {
            job,
            run_id,
            started_at,
            handle,
        }
    }
}

impl Launched {
    async fn finish(self) -> Result<JobSuccess, JobFailure> {
        let Launched {
            job,
            run_id,
            started_at,
            handle,
        } = self;
        match handle.await {
            Ok((elapsed, Ok(output))) => {
                tracing::debug!(run_id = %run_id, job = %job.id, elapsed_secs = elapsed.as_secs_f64(), "job succeeded");
                Ok(JobSuccess {
                    job,
                    run_id,
                    elapsed,
                    output,
                })
            }
            Ok((elapsed, Err(error))) => {
                tracing::warn!(run_id = %run_id, job = %job.id, "job failed: {}", error);
                Err(JobFailure {
                    job,
                    run_id: Some(run_id),
                    elapsed,
                    error,
                })
            }
            Err(e) => {
                tracing::error!(run_id = %run_id, job = %job.id, "job task aborted: {}", e);
                Err(JobFailure {
                    job,
                    run_id: Some(run_id),
                    elapsed: started_at.elapsed(),
                    error: JobError::Panicked(e.to_string()),
                })
            }
        }
    }
}

fn no_permit(job: JobEntry, e: AcquireError) -> JobFailure {
    JobFailure {
        job,
        run_id: None,
        elapsed: Duration::ZERO,
        error: JobError::Spawn(format!("no permit: {e}")),
    }
}

fn record(outcome: &mut FamilyOutcome, result: Result<JobSuccess, JobFailure>) {
    match result {
        Ok(success) => outcome.successes.push(success),
        Err(failure) => outcome.failures.push(failure),
    }
}
