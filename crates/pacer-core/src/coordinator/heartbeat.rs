//! Periodic progress log for a running unit.
//!
//! Purely informational: reads the run registry, logs, and never feeds back
//! into scheduling.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::scheduler::{ActiveRun, RunRegistry};

/// Running heartbeat task. Stopped explicitly with [`Heartbeat::stop`], or
/// cancelled when dropped.
#[derive(Debug)]
pub struct Heartbeat {
    cancel: CancellationToken,
    task: Option<JoinHandle<u64>>,
}

impl Heartbeat {
    /// First tick fires one `every` after `started`.
    pub fn start(
        unit: String,
        started: Instant,
        registry: Arc<RunRegistry>,
        every: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(started + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut ticks = 0u64;
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        ticks += 1;
                        let now = Instant::now();
                        for line in heartbeat_lines(&unit, now - started, &registry.active(), now) {
                            tracing::info!("{}", line);
                        }
                    }
                }
            }
            ticks
        });
        Self {
            cancel,
            task: Some(task),
        }
    }

    /// Cancel the task and return how many times it ticked.
    pub async fn stop(mut self) -> u64 {
        self.cancel.cancel();
        match self.task.take() {
            Some(task) => task.await.unwrap_or(0),
            None => 0,
        }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// One line for the unit, then one indented line per active run.
pub fn heartbeat_lines(
    unit: &str,
    elapsed: Duration,
    runs: &[ActiveRun],
    now: Instant,
) -> Vec<String> {
    let mut lines = Vec::with_capacity(runs.len() + 1);
    lines.push(format!(
        "[heartbeat] unit {} running for {} ({} active)",
        unit,
        format_elapsed(elapsed),
        runs.len()
    ));
    for run in runs {
        lines.push(format!(
            "  {} job={} {}",
            run.run_id,
            run.job_id,
            format_elapsed(now.saturating_duration_since(run.started_at))
        ));
    }
    lines
}

/// `45s`, `2m05s`, `1h02m03s`.
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let (h, m, s) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if h > 0 {
        format!("{h}h{m:02}m{s:02}s")
    } else if m > 0 {
        format!("{m}m{s:02}s")
    } else {
        format!("{s}s")
    }
}
