//! Handle to a family batch running in the background.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::event::Category;
use crate::job::Family;

use super::outcome::FamilyOutcome;

#[derive(Debug)]
pub struct RunHandle {
    pub family: Family,
    pub category: Option<Category>,
    pub started_at: Instant,
    handle: JoinHandle<FamilyOutcome>,
}

impl RunHandle {
    /// Spawn a batch onto the runtime.
    pub fn spawn<F>(family: Family, category: Option<Category>, batch: F) -> Self
    where
        F: Future<Output = FamilyOutcome> + Send + 'static,
    {
        Self {
            family,
            category,
            started_at: Instant::now(),
            handle: tokio::spawn(batch),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the batch. A batch task that died yields an empty outcome;
    /// individual job failures are already captured inside the outcome.
    pub async fn join(self) -> FamilyOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(family = %self.family, "batch task failed: {}", e);
                FamilyOutcome::new(self.family, self.category)
            }
        }
    }
}
