//! Typed telemetry events decoded from external job output.
//!
//! Jobs print one record per line, e.g.
//! `2024-05-01 12:00:00 [RUN_START] id=r1 provider=openai model=gpt-4.1 attempt=1`.
//! `decode` turns such a line into at most one [`Event`]; anything else is
//! ignored.

mod category;
mod decode;

use std::path::PathBuf;

use serde::Serialize;

pub use category::{Category, CategoryCounts, CategoryHints};
pub use decode::{decode, TAG_CONCURRENCY, TAG_RUN_COMPLETE, TAG_RUN_START};

/// Concurrency limit advertised by a running batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConcurrencyAdvertisement {
    pub enabled: bool,
    pub max_concurrency: usize,
    pub qps: Option<f64>,
}

/// A single run (one iteration of a job) has started.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunStart {
    pub id: String,
    pub category: Category,
    pub provider: String,
    pub model: String,
    pub target: Option<String>,
    pub output: Option<String>,
    pub attempt: u32,
}

/// A single run has finished, successfully or not.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunComplete {
    pub id: String,
    pub category: Category,
    pub provider: String,
    pub model: String,
    pub ok: bool,
    pub elapsed_seconds: Option<f64>,
    pub status: Option<String>,
    pub output_path: Option<PathBuf>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    ConcurrencyAdvertisement(ConcurrencyAdvertisement),
    RunStart(RunStart),
    RunComplete(RunComplete),
}

impl Event {
    /// Category of a run event; advertisements have none.
    pub fn category(&self) -> Option<Category> {
        match self {
            Event::ConcurrencyAdvertisement(_) => None,
            Event::RunStart(start) => Some(start.category),
            Event::RunComplete(done) => Some(done.category),
        }
    }
}
