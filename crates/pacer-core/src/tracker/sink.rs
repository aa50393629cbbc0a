//! Per-job handle for feeding output lines into the unit's tracker.

use std::sync::Arc;

use crate::event::{decode, CategoryHints, Event};
use crate::job::Family;

use super::InflightTracker;

/// Handed to every job runner. Lines from the tiered family update the
/// tracker; lines from other families are decoded but leave it untouched.
#[derive(Debug, Clone)]
pub struct EventSink {
    family: Family,
    hints: Arc<CategoryHints>,
    tracker: Option<Arc<InflightTracker>>,
}

impl EventSink {
    /// Sink that applies decoded events to `tracker`.
    pub fn attached(tracker: Arc<InflightTracker>, hints: Arc<CategoryHints>, family: Family) -> Self {
        Self {
            family,
            hints,
            tracker: Some(tracker),
        }
    }

    /// Sink that only decodes.
    pub fn detached(hints: Arc<CategoryHints>, family: Family) -> Self {
        Self {
            family,
            hints,
            tracker: None,
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    pub fn is_attached(&self) -> bool {
        self.tracker.is_some()
    }

    /// Decode `line`, apply the events to the tracker if attached, and return
    /// them so the caller can pick out outputs.
    pub fn observe(&self, line: &str) -> Vec<Event> {
        let events = decode(line, &self.hints);
        if let Some(tracker) = &self.tracker {
            for event in &events {
                tracker.update(event);
            }
        }
        events
    }
}
