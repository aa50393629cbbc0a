//! Inflight accounting for the tiered family.
//!
//! One `InflightTracker` is created per unit of work and shared (behind an
//! `Arc`) by every output stream of the tiered family's jobs. All counters
//! live behind a single mutex; readers only ever get copies (`Headroom`,
//! `TrackerSnapshot`).

mod headroom;
mod sink;
mod snapshot;

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::event::{decode, Category, CategoryCounts, CategoryHints, Event};

pub use headroom::Headroom;
pub use sink::EventSink;
pub use snapshot::TrackerSnapshot;

#[derive(Debug, Clone, Default)]
pub(crate) struct InflightState {
    pub(crate) totals: CategoryCounts,
    pub(crate) inflight: CategoryCounts,
    pub(crate) completed: CategoryCounts,
    /// Latest advertised ceiling; `None` until the first advertisement.
    pub(crate) effective_max: Option<usize>,
}

impl InflightState {
    /// Ceiling currently believed to apply. Before any advertisement this is a
    /// heuristic: the number of primary runs planned for the unit.
    pub(crate) fn effective_max(&self) -> usize {
        self.effective_max
            .unwrap_or_else(|| self.totals.primary.max(1))
    }

    fn apply(&mut self, event: &Event) {
        match event {
            Event::ConcurrencyAdvertisement(ad) => {
                self.effective_max = Some(ad.max_concurrency.max(1));
            }
            Event::RunStart(start) => {
                *self.inflight.get_mut(start.category) += 1;
            }
            Event::RunComplete(done) => {
                let slot = self.inflight.get_mut(done.category);
                *slot = slot.saturating_sub(1);
                *self.completed.get_mut(done.category) += 1;
            }
        }
    }
}

/// Mutable inflight/completed counters plus the learned concurrency ceiling.
#[derive(Debug, Default)]
pub struct InflightTracker {
    state: Mutex<InflightState>,
}

impl InflightTracker {
    /// Create a tracker for a unit with the given planned totals and an
    /// optional known ceiling.
    pub fn new(totals: CategoryCounts, effective_max: Option<usize>) -> Self {
        Self {
            state: Mutex::new(InflightState {
                totals,
                effective_max: effective_max.map(|n| n.max(1)),
                ..InflightState::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, InflightState> {
        // Counters stay consistent under every single update, so a poisoned
        // lock is still safe to read.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply one event. Advertisements are last-write-wins; run completions
    /// never drive a counter below zero.
    pub fn update(&self, event: &Event) {
        let mut state = self.lock();
        state.apply(event);
        match event {
            Event::ConcurrencyAdvertisement(ad) => tracing::debug!(
                max_concurrency = ad.max_concurrency,
                enabled = ad.enabled,
                "concurrency advertised"
            ),
            Event::RunStart(start) => tracing::trace!(
                id = %start.id,
                category = %start.category,
                inflight = state.inflight.get(start.category),
                "run started"
            ),
            Event::RunComplete(done) => tracing::trace!(
                id = %done.id,
                category = %done.category,
                ok = done.ok,
                inflight = state.inflight.get(done.category),
                "run completed"
            ),
        }
    }

    /// Decode one output line and apply whatever it yields. Returns the number
    /// of events applied (0 for unrecognized lines).
    pub fn observe(&self, line: &str, hints: &CategoryHints) -> usize {
        let events = decode(line, hints);
        for event in &events {
            self.update(event);
        }
        events.len()
    }

    /// Current slack for admitting new primary work.
    pub fn headroom(&self, low_watermark: Option<usize>) -> Headroom {
        let state = self.lock();
        Headroom::compute(
            state.effective_max(),
            state.inflight.get(Category::Primary),
            low_watermark,
        )
    }

    /// Read-only copy for logging and reports.
    pub fn snapshot(&self) -> TrackerSnapshot {
        TrackerSnapshot::from_state(&self.lock())
    }
}
