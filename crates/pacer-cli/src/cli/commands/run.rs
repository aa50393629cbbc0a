//! `pacer run` – run one plan file as a unit of work and print the report.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use pacer_core::config::PacerConfig;
use pacer_core::coordinator::{format_elapsed, RunCoordinator, UnitSummary};
use pacer_core::job::JobRunner;

use crate::cli::launcher::ProcessLauncher;
use crate::cli::plan::{default_unit_name, PlanSource};

pub async fn run_plan(
    cfg: &PacerConfig,
    plan: &Path,
    unit: Option<String>,
    await_secondary: bool,
    json: bool,
) -> Result<()> {
    let unit = unit.unwrap_or_else(|| default_unit_name(plan));
    let mut cfg = cfg.clone();
    cfg.await_secondary |= await_secondary;

    let source = PlanSource::new(plan);
    let mut launcher = ProcessLauncher::new();
    if let Some(dir) = source.workdir() {
        launcher = launcher.with_workdir(dir);
    }
    let runner: Arc<dyn JobRunner> = Arc::new(launcher);
    let coordinator = RunCoordinator::from_config(&cfg);
    let mut report = coordinator.run_unit(&unit, &source, runner).await?;

    if report.secondary.is_detached() {
        if !json {
            print!("{}", render_summary(&report.summary()));
            println!("secondary batch still running; waiting before exit");
        }
        // The runtime (and every child process) goes away when main returns.
        report.finish_secondary().await;
        if !json {
            if let Some(outcome) = report.secondary.outcome() {
                println!(
                    "secondary batch: {} ok, {} failed",
                    outcome.successes.len(),
                    outcome.failures.len()
                );
                for failure in &outcome.failures {
                    println!("  FAILED {}: {}", failure.job.id, failure.error);
                }
            }
            return Ok(());
        }
    }

    let summary = report.summary();
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print!("{}", render_summary(&summary));
    }
    Ok(())
}

/// Human-readable report: one line per job, failures with their reason.
pub fn render_summary(summary: &UnitSummary) -> String {
    let elapsed = format_elapsed(Duration::from_secs_f64(summary.elapsed_secs.max(0.0)));
    let mut out = format!(
        "unit {}: {} ok, {} failed in {}\n",
        summary.unit, summary.succeeded, summary.failed, elapsed
    );
    out.push_str(&format!("{:<28} {:<24} {}\n", "FAMILY", "JOB", "RESULT"));
    for family in &summary.families {
        let label = match family.category {
            Some(category) => format!("{}/{}", family.family, category),
            None => family.family.to_string(),
        };
        for id in &family.succeeded {
            out.push_str(&format!("{:<28} {:<24} ok\n", label, id));
        }
        for failed in &family.failed {
            out.push_str(&format!(
                "{:<28} {:<24} FAILED: {}\n",
                label, failed.id, failed.error
            ));
        }
    }
    let outputs: Vec<_> = summary.families.iter().flat_map(|f| f.outputs.iter()).collect();
    if !outputs.is_empty() {
        out.push_str("outputs:\n");
        for path in outputs {
            out.push_str(&format!("  {}\n", path.display()));
        }
    }
    out
}
