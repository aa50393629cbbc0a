//! Job entries, families, and the seam through which callers launch jobs.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::JobError;
use crate::event::Category;
use crate::tracker::EventSink;

/// Class of jobs sharing one concurrency policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// Category-bearing family; its output feeds the inflight tracker.
    Tiered,
    /// Starts immediately, never gated.
    Independent,
    /// Gated on tiered headroom; runs first.
    FirstDependent,
    /// Gated on tiered headroom; runs after the first dependent family.
    SecondDependent,
}

impl Family {
    pub const ALL: [Family; 4] = [
        Family::Tiered,
        Family::Independent,
        Family::FirstDependent,
        Family::SecondDependent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Family::Tiered => "tiered",
            Family::Independent => "independent",
            Family::FirstDependent => "first_dependent",
            Family::SecondDependent => "second_dependent",
        }
    }
}

impl std::fmt::Display for Family {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_iterations() -> u32 {
    1
}

/// One configured job. The core reads only `id`, `family`, `category`,
/// `provider`, `model` and `iterations`; the rest is for the launcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEntry {
    pub id: String,
    pub family: Family,
    /// Only meaningful for the tiered family; derived from provider/model when absent.
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub provider: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub target: String,
    /// Runs the job performs; each one emits its own run-start record.
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    /// Per-job timeout applied by the launcher, not the scheduler.
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Program and arguments for process-based launchers.
    #[serde(default)]
    pub command: Vec<String>,
}

impl JobEntry {
    pub fn new(id: impl Into<String>, family: Family) -> Self {
        Self {
            id: id.into(),
            family,
            category: None,
            provider: String::new(),
            model: String::new(),
            target: String::new(),
            iterations: default_iterations(),
            timeout_secs: None,
            command: Vec::new(),
        }
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    pub fn with_model(mut self, provider: impl Into<String>, model: impl Into<String>) -> Self {
        self.provider = provider.into();
        self.model = model.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = Some(timeout.as_secs_f64());
        self
    }

    pub fn with_command<I, S>(mut self, argv: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = argv.into_iter().map(Into::into).collect();
        self
    }

    /// Timeout as a duration; non-positive or non-finite values mean none.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs
            .filter(|s| s.is_finite() && *s > 0.0)
            .map(Duration::from_secs_f64)
    }
}

/// What a successful job hands to the evaluation stage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct JobOutput {
    pub paths: Vec<PathBuf>,
}

pub type JobFuture = Pin<Box<dyn Future<Output = Result<JobOutput, JobError>> + Send + 'static>>;

/// Launches one job. Injected by the caller; the scheduler never looks inside.
pub trait JobRunner: Send + Sync + 'static {
    fn launch(&self, job: JobEntry, sink: EventSink) -> JobFuture;
}

impl<F, Fut> JobRunner for F
where
    F: Fn(JobEntry, EventSink) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<JobOutput, JobError>> + Send + 'static,
{
    fn launch(&self, job: JobEntry, sink: EventSink) -> JobFuture {
        Box::pin(self(job, sink))
    }
}

/// Supplies the configured job list for one unit of work.
pub trait JobSource {
    fn load_jobs(&self) -> anyhow::Result<Vec<JobEntry>>;
}

impl JobSource for Vec<JobEntry> {
    fn load_jobs(&self) -> anyhow::Result<Vec<JobEntry>> {
        Ok(self.clone())
    }
}
