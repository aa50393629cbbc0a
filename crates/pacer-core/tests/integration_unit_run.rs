//! Integration test: whole units of work driven through the coordinator.
//!
//! Jobs are scripted fakes that print the same records a real batch process
//! does, so the tracker, gate and scheduler are exercised end to end on
//! tokio's paused clock.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::scripted_runner::ScriptedRunner;
use pacer_core::config::{FamilyConcurrency, PacerConfig};
use pacer_core::coordinator::{CoordinatorSettings, RunCoordinator, SecondaryBatch};
use pacer_core::error::PacerError;
use pacer_core::event::Category;
use pacer_core::job::{Family, JobEntry, JobRunner, JobSource};
use tokio::time::Instant;

fn settings(low_watermark: Option<usize>, await_secondary: bool) -> CoordinatorSettings {
    CoordinatorSettings {
        heartbeat_interval: Duration::from_secs(1),
        poll_interval: Duration::from_millis(500),
        low_watermark,
        await_secondary,
        ..CoordinatorSettings::default()
    }
}

fn coordinator(settings: CoordinatorSettings) -> RunCoordinator {
    RunCoordinator::new(settings, PacerConfig::default().concurrency)
}

fn tiered(id: &str, provider: &str, model: &str) -> JobEntry {
    JobEntry::new(id, Family::Tiered).with_model(provider, model)
}

#[tokio::test(start_paused = true)]
async fn full_unit_partitions_results_and_leaves_secondary_running() {
    let runner = ScriptedRunner::builder()
        .advertise(2)
        .duration("t1", Duration::from_secs(2))
        .duration("t2", Duration::from_secs(3))
        .duration("deep", Duration::from_secs(3600))
        .duration("d1", Duration::from_secs(1))
        .duration("d2", Duration::from_secs(1))
        .duration("e1", Duration::from_secs(1))
        .fail("i1")
        .build();
    let jobs = vec![
        tiered("t1", "openai", "gpt-4.1"),
        JobEntry::new("i1", Family::Independent),
        tiered("deep", "openaidr", "o3-deep-research"),
        JobEntry::new("d1", Family::FirstDependent),
        tiered("t2", "anthropic", "claude-sonnet"),
        JobEntry::new("e1", Family::SecondDependent),
        JobEntry::new("i2", Family::Independent),
        JobEntry::new("d2", Family::FirstDependent),
    ];

    let dyn_runner: Arc<dyn JobRunner> = Arc::new(runner.clone());
    let mut report = coordinator(settings(Some(1), false))
        .run_unit("unit-a", &jobs, dyn_runner)
        .await
        .expect("unit runs");

    let primary = report.family(Family::Tiered).expect("tiered outcome");
    assert_eq!(primary.category, Some(Category::Primary));
    assert_eq!(primary.success_ids(), vec!["t1", "t2"]);

    let independent = report.family(Family::Independent).expect("independent outcome");
    assert_eq!(independent.success_ids(), vec!["i2"]);
    assert_eq!(independent.failure_ids(), vec!["i1"]);

    let first = report.family(Family::FirstDependent).expect("first dependent");
    assert_eq!(first.success_ids(), vec!["d1", "d2"]);
    let second = report.family(Family::SecondDependent).expect("second dependent");
    assert_eq!(second.success_ids(), vec!["e1"]);

    // Dependent families run one after the other; launches inside a family are paced.
    let (d1, d2, e1) = (runner.record("d1"), runner.record("d2"), runner.record("e1"));
    assert!(d2.launched - d1.launched >= Duration::from_secs(1));
    assert!(e1.launched >= d1.finished.unwrap());
    assert!(e1.launched >= d2.finished.unwrap());

    // The secondary batch is still running and did not hold anything up.
    assert!(report.secondary.is_detached());
    assert!(runner.record("deep").finished.is_none());
    assert_eq!(report.tracker.inflight.secondary, 1);
    assert_eq!(report.tracker.inflight.primary, 0);
    assert_eq!(report.tracker.completed.primary, 2);
    assert_eq!(report.tracker.effective_max, 2);
    assert!(report.tracker.advertised);
    assert!(report.heartbeats >= 3);

    let summary = report.summary();
    assert_eq!(summary.succeeded, 6);
    assert_eq!(summary.failed, 1);
    assert!(summary.secondary_pending);
    let json = serde_json::to_value(&summary).unwrap();
    assert_eq!(json["unit"], "unit-a");
    assert_eq!(json["families"][0]["family"], "tiered");
    assert_eq!(json["families"][0]["category"], "primary");

    report.finish_secondary().await;
    let deep = report.secondary.outcome().expect("secondary awaited");
    assert_eq!(deep.success_ids(), vec!["deep"]);
    let summary = report.summary();
    assert!(!summary.secondary_pending);
    assert_eq!(summary.succeeded, 7);
    assert!(summary
        .families
        .iter()
        .any(|f| f.outputs.iter().any(|p| p.ends_with("deep.md"))));
}

#[tokio::test(start_paused = true)]
async fn dependents_wait_for_advertised_headroom() {
    // No primary jobs: the default ceiling is 1, too small for a watermark of
    // 2, until the secondary batch advertises a larger one.
    let runner = ScriptedRunner::builder()
        .advertise(3)
        .duration("deep", Duration::from_secs(600))
        .build();
    let jobs = vec![
        tiered("deep", "openaidr", "o3"),
        JobEntry::new("d1", Family::FirstDependent),
    ];
    let started = Instant::now();
    let dyn_runner: Arc<dyn JobRunner> = Arc::new(runner.clone());
    let report = coordinator(settings(Some(2), false))
        .run_unit("unit-b", &jobs, dyn_runner)
        .await
        .unwrap();

    let d1 = runner.record("d1");
    let waited = d1.launched - started;
    assert!(waited >= Duration::from_millis(500), "d1 started after {waited:?}");
    assert!(waited < Duration::from_secs(1), "d1 started after {waited:?}");
    assert!(runner.record("deep").finished.is_none());
    assert!(report.secondary.is_detached());
    assert!(report.family(Family::Tiered).is_none());
}

#[tokio::test(start_paused = true)]
async fn await_secondary_collects_secondary_batch() {
    let runner = ScriptedRunner::builder()
        .duration("deep", Duration::from_secs(60))
        .fail("deep")
        .build();
    let jobs = vec![
        tiered("t1", "openai", "gpt-4.1"),
        tiered("deep", "google", "gemini-deep-research"),
    ];
    let dyn_runner: Arc<dyn JobRunner> = Arc::new(runner.clone());
    let report = coordinator(settings(Some(1), true))
        .run_unit("unit-c", &jobs, dyn_runner)
        .await
        .unwrap();

    match &report.secondary {
        SecondaryBatch::Awaited(outcome) => {
            assert_eq!(outcome.category, Some(Category::Secondary));
            assert_eq!(outcome.failure_ids(), vec!["deep"]);
        }
        other => panic!("expected awaited secondary batch, got {other:?}"),
    }
    assert_eq!(report.failures().count(), 1);
    assert_eq!(report.successes().count(), 1);
    assert_eq!(report.tracker.completed.secondary, 1);
    assert!(runner.record("deep").finished.is_some());
}

#[tokio::test(start_paused = true)]
async fn unit_without_secondary_jobs_reports_empty_batch() {
    let runner = ScriptedRunner::builder().build();
    let jobs = vec![
        JobEntry::new("i1", Family::Independent),
        JobEntry::new("e1", Family::SecondDependent),
    ];
    let dyn_runner: Arc<dyn JobRunner> = Arc::new(runner);
    let report = coordinator(settings(Some(1), false))
        .run_unit("unit-d", &jobs, dyn_runner)
        .await
        .unwrap();
    assert!(matches!(report.secondary, SecondaryBatch::Empty));
    assert_eq!(report.families.len(), 2);
    assert!(report.family(Family::FirstDependent).is_none());
    assert_eq!(report.summary().succeeded, 2);
}

#[tokio::test(start_paused = true)]
async fn oversized_launch_delay_still_runs_every_job() {
    let runner = ScriptedRunner::builder().build();
    let mut concurrency = PacerConfig::default().concurrency;
    concurrency.set_family(Family::FirstDependent, FamilyConcurrency::new(true, 2, 1e20));
    let jobs = vec![
        JobEntry::new("d1", Family::FirstDependent),
        JobEntry::new("d2", Family::FirstDependent),
    ];
    let dyn_runner: Arc<dyn JobRunner> = Arc::new(runner.clone());
    let report = RunCoordinator::new(settings(None, false), concurrency)
        .run_unit("unit-f", &jobs, dyn_runner)
        .await
        .expect("unit runs");

    let first = report.family(Family::FirstDependent).expect("first dependent");
    assert_eq!(first.success_ids(), vec!["d1", "d2"]);
    assert_eq!(report.failures().count(), 0);
    let (d1, d2) = (runner.record("d1"), runner.record("d2"));
    assert!(d2.launched - d1.launched >= Duration::from_secs(86_400));
}

struct MissingPlan;

impl JobSource for MissingPlan {
    fn load_jobs(&self) -> anyhow::Result<Vec<JobEntry>> {
        anyhow::bail!("plan.toml: no such file")
    }
}

#[tokio::test]
async fn load_failure_is_the_only_error() {
    let runner: Arc<dyn JobRunner> = Arc::new(ScriptedRunner::builder().build());
    let err = coordinator(settings(None, false))
        .run_unit("unit-e", &MissingPlan, runner)
        .await
        .unwrap_err();
    match &err {
        PacerError::LoadJobs { unit, reason } => {
            assert_eq!(unit, "unit-e");
            assert!(reason.contains("no such file"));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert!(err.to_string().contains("unit-e"));
}
