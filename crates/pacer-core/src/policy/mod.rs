//! Effective concurrency policy per family.
//!
//! Family settings come from the user's config; an optional enforcement
//! overlay may only tighten them. Resolution never fails: anything that does
//! not coerce cleanly falls back to [`ConcurrencyPolicy::conservative`].

mod coerce;
mod resolve;

use std::time::Duration;

use serde::Serialize;

pub use resolve::{resolve, resolve_all};

/// Upper bound on the launch gap: one day.
pub const MAX_LAUNCH_DELAY_SECS: f64 = 86_400.0;

/// Resolved, immutable knobs for running one family.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConcurrencyPolicy {
    /// `false` runs the family strictly one job at a time.
    pub enabled: bool,
    /// Permit pool size when enabled; always at least 1.
    pub max_concurrency: usize,
    /// Minimum gap between successive launches, within
    /// `0..=MAX_LAUNCH_DELAY_SECS`.
    pub launch_delay_seconds: f64,
}

impl ConcurrencyPolicy {
    /// Sequential, no pacing.
    pub const fn conservative() -> Self {
        Self {
            enabled: false,
            max_concurrency: 1,
            launch_delay_seconds: 0.0,
        }
    }

    /// Build a policy, clamping values into range.
    pub fn new(enabled: bool, max_concurrency: usize, launch_delay_seconds: f64) -> Self {
        let launch_delay_seconds = if launch_delay_seconds.is_finite() {
            launch_delay_seconds.clamp(0.0, MAX_LAUNCH_DELAY_SECS)
        } else {
            0.0
        };
        Self {
            enabled,
            max_concurrency: max_concurrency.max(1),
            launch_delay_seconds,
        }
    }

    /// The fields are public, so clamp again rather than trust them.
    pub fn launch_delay(&self) -> Duration {
        let secs = self.launch_delay_seconds.clamp(0.0, MAX_LAUNCH_DELAY_SECS);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::ZERO)
    }
}

impl Default for ConcurrencyPolicy {
    fn default() -> Self {
        Self::conservative()
    }
}
