//! Per-family results: successes and failures as data.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::error::JobError;
use crate::event::Category;
use crate::job::{Family, JobEntry, JobOutput};

use super::registry::RunId;

#[derive(Debug, Clone)]
pub struct JobSuccess {
    pub job: JobEntry,
    pub run_id: RunId,
    pub elapsed: Duration,
    pub output: JobOutput,
}

#[derive(Debug, Clone)]
pub struct JobFailure {
    pub job: JobEntry,
    /// `None` when the job never got a permit.
    pub run_id: Option<RunId>,
    pub elapsed: Duration,
    pub error: JobError,
}

/// Everything one family (or one tiered batch) produced, in input order.
#[derive(Debug, Clone)]
pub struct FamilyOutcome {
    pub family: Family,
    /// Set for the tiered family's batches.
    pub category: Option<Category>,
    pub successes: Vec<JobSuccess>,
    pub failures: Vec<JobFailure>,
}

impl FamilyOutcome {
    pub fn new(family: Family, category: Option<Category>) -> Self {
        Self {
            family,
            category,
            successes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn success_ids(&self) -> Vec<&str> {
        self.successes.iter().map(|s| s.job.id.as_str()).collect()
    }

    pub fn failure_ids(&self) -> Vec<&str> {
        self.failures.iter().map(|f| f.job.id.as_str()).collect()
    }

    /// Number of jobs that ran (or tried to).
    pub fn len(&self) -> usize {
        self.successes.len() + self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn label(&self) -> String {
        match self.category {
            Some(category) => format!("{}/{}", self.family, category),
            None => self.family.to_string(),
        }
    }

    pub fn summary(&self) -> FamilySummary {
        FamilySummary {
            family: self.family,
            category: self.category,
            succeeded: self.successes.iter().map(|s| s.job.id.clone()).collect(),
            failed: self
                .failures
                .iter()
                .map(|f| FailedJob {
                    id: f.job.id.clone(),
                    error: f.error.to_string(),
                })
                .collect(),
            outputs: self
                .successes
                .iter()
                .flat_map(|s| s.output.paths.iter().cloned())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedJob {
    pub id: String,
    pub error: String,
}

/// Serializable view of a `FamilyOutcome` for the evaluation stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FamilySummary {
    pub family: Family,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    pub succeeded: Vec<String>,
    pub failed: Vec<FailedJob>,
    pub outputs: Vec<PathBuf>,
}
