//! Launch scheduling for one family at a time.
//!
//! Coordinates the permit pool, launch pacing and the run registry:
//! acquire permit → wait for the launch clock → register run → spawn job →
//! deregister on completion → partition results.
//! Every family uses the same `PacedPermitPool` abstraction with its own
//! policy.

mod guard;
mod handle;
mod launch;
mod outcome;
mod pool;
mod registry;

pub use guard::RunGuard;
pub use handle::RunHandle;
pub use launch::LaunchScheduler;
pub use outcome::{FailedJob, FamilyOutcome, FamilySummary, JobFailure, JobSuccess};
pub use pool::PacedPermitPool;
pub use registry::{ActiveRun, RunId, RunRegistry};
