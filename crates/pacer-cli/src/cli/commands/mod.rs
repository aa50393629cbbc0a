//! CLI command handlers, one file per command.

mod completions;
mod decode;
mod policy;
mod run;

pub use completions::{run_completions, run_manpage};
pub use decode::run_decode;
pub use policy::run_policy;
pub use run::run_plan;
