//! Plan files: the job list for one unit of work.
//!
//! ```toml
//! [[jobs]]
//! id = "gpt-report"
//! family = "tiered"
//! provider = "openai"
//! model = "gpt-4.1"
//! command = ["./make-report.sh", "--model", "gpt-4.1"]
//! timeout_secs = 1800
//! ```

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use pacer_core::job::{JobEntry, JobSource};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct PlanFile {
    #[serde(default)]
    jobs: Vec<JobEntry>,
}

#[derive(Debug, Clone)]
pub struct PlanSource {
    path: PathBuf,
}

impl PlanSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Directory job commands run from: the plan file's own directory.
    pub fn workdir(&self) -> Option<&Path> {
        self.path.parent().filter(|p| !p.as_os_str().is_empty())
    }
}

impl JobSource for PlanSource {
    fn load_jobs(&self) -> Result<Vec<JobEntry>> {
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("reading plan {}", self.path.display()))?;
        parse_plan(&text).with_context(|| format!("parsing plan {}", self.path.display()))
    }
}

/// Parse plan TOML and check job ids: non-empty and unique.
pub fn parse_plan(text: &str) -> Result<Vec<JobEntry>> {
    let plan: PlanFile = toml::from_str(text)?;
    let mut seen = HashSet::new();
    for job in &plan.jobs {
        if job.id.trim().is_empty() {
            bail!("job with empty id");
        }
        if !seen.insert(job.id.as_str()) {
            bail!("duplicate job id {:?}", job.id);
        }
    }
    Ok(plan.jobs)
}

/// Unit name for a plan: its file stem, or "unit".
pub fn default_unit_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("unit")
        .to_string()
}
