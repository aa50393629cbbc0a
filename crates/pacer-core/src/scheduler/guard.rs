//! RAII guard that deregisters a run when dropped.

use std::sync::Arc;

use super::registry::{RunId, RunRegistry};

/// Deregisters its run when dropped (success, failure, timeout or panic).
#[derive(Debug)]
pub struct RunGuard {
    registry: Arc<RunRegistry>,
    run_id: RunId,
}

impl RunGuard {
    pub(super) fn new(registry: Arc<RunRegistry>, run_id: RunId) -> Self {
        Self { registry, run_id }
    }

    pub fn run_id(&self) -> RunId {
        self.run_id
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry.deregister(self.run_id);
    }
}
