//! Error types for the core.
//!
//! Job-level failures are data (`JobError` inside a `FamilyOutcome`), not
//! propagated errors. Only loading the job list for a unit of work surfaces as
//! a `PacerError` from the coordinator.

use std::time::Duration;

use thiserror::Error;

/// Errors that abort a unit of work before any job is launched.
#[derive(Debug, Error)]
pub enum PacerError {
    /// The job source for a unit could not be read or parsed.
    #[error("could not load jobs for unit {unit}: {reason}")]
    LoadJobs { unit: String, reason: String },
}

/// Why a single job did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The job reported a failure of its own.
    #[error("{0}")]
    Failed(String),

    /// External process exited unsuccessfully (`None` = killed by a signal).
    #[error("exited with {}", describe_status(.0))]
    ExitStatus(Option<i32>),

    /// Caller-applied timeout expired.
    #[error("timed out after {:.1}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// Job could not be started at all.
    #[error("could not start: {0}")]
    Spawn(String),

    /// The task running the job panicked or was cancelled.
    #[error("job task aborted: {0}")]
    Panicked(String),
}

fn describe_status(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {code}"),
        None => "signal".to_string(),
    }
}
