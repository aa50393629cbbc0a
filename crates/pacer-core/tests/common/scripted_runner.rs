//! Fake job runner for integration tests.
//!
//! Each job prints the same records a real batch process would (advertisement,
//! run start, run complete) through its event sink, sleeps for its scripted
//! duration and then succeeds or fails as configured. Launch and finish times
//! are recorded so tests can check ordering under tokio's paused clock.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pacer_core::error::JobError;
use pacer_core::job::{Family, JobEntry, JobFuture, JobOutput, JobRunner};
use pacer_core::tracker::EventSink;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub struct LaunchRecord {
    pub id: String,
    pub family: Family,
    pub launched: Instant,
    pub finished: Option<Instant>,
}

#[derive(Debug, Default)]
struct Script {
    durations: HashMap<String, Duration>,
    failing: HashSet<String>,
    advertise: Option<usize>,
    log: Mutex<Vec<LaunchRecord>>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    script: Arc<Script>,
}

impl ScriptedRunner {
    pub fn builder() -> ScriptedRunnerBuilder {
        ScriptedRunnerBuilder::default()
    }

    pub fn log(&self) -> Vec<LaunchRecord> {
        self.script.log.lock().unwrap().clone()
    }

    pub fn record(&self, id: &str) -> LaunchRecord {
        self.log()
            .into_iter()
            .find(|r| r.id == id)
            .unwrap_or_else(|| panic!("job {id} never launched"))
    }
}

#[derive(Debug, Default)]
pub struct ScriptedRunnerBuilder {
    script: Script,
}

impl ScriptedRunnerBuilder {
    pub fn duration(mut self, id: &str, d: Duration) -> Self {
        self.script.durations.insert(id.to_string(), d);
        self
    }

    pub fn fail(mut self, id: &str) -> Self {
        self.script.failing.insert(id.to_string());
        self
    }

    /// Tiered jobs print a concurrency advertisement before their first run.
    pub fn advertise(mut self, max_concurrency: usize) -> Self {
        self.script.advertise = Some(max_concurrency);
        self
    }

    pub fn build(self) -> ScriptedRunner {
        ScriptedRunner {
            script: Arc::new(self.script),
        }
    }
}

impl JobRunner for ScriptedRunner {
    fn launch(&self, job: JobEntry, sink: EventSink) -> JobFuture {
        let script = Arc::clone(&self.script);
        Box::pin(async move {
            let index = {
                let mut log = script.log.lock().unwrap();
                log.push(LaunchRecord {
                    id: job.id.clone(),
                    family: job.family,
                    launched: Instant::now(),
                    finished: None,
                });
                log.len() - 1
            };
            if let Some(max) = script.advertise {
                sink.observe(&format!("[CONCURRENCY] enabled=true max_concurrency={max} qps=na"));
            }
            sink.observe(&format!(
                "[RUN_START] id={} provider={} model={} target={} attempt=1",
                job.id, job.provider, job.model, job.target
            ));

            let duration = script
                .durations
                .get(&job.id)
                .copied()
                .unwrap_or(Duration::from_millis(100));
            tokio::time::sleep(duration).await;

            let ok = !script.failing.contains(&job.id);
            let output = PathBuf::from(format!("out/{}.md", job.id));
            if ok {
                sink.observe(&format!(
                    "[RUN_COMPLETE] id={} provider={} model={} ok=true elapsed_seconds={:.1} status=completed output_path={}",
                    job.id,
                    job.provider,
                    job.model,
                    duration.as_secs_f64(),
                    output.display()
                ));
            } else {
                sink.observe(&format!(
                    "[RUN_COMPLETE] id={} provider={} model={} ok=false elapsed_seconds=na status=failed output_path=na error=scripted failure",
                    job.id, job.provider, job.model
                ));
            }
            script.log.lock().unwrap()[index].finished = Some(Instant::now());

            if ok {
                Ok(JobOutput {
                    paths: vec![output],
                })
            } else {
                Err(JobError::Failed(format!("{} scripted to fail", job.id)))
            }
        })
    }
}
