//! Headroom: how much primary work can be admitted right now.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Headroom {
    pub effective_max: usize,
    pub primary_inflight: usize,
    /// `max(0, effective_max - primary_inflight)`.
    pub available: usize,
    pub ready: bool,
}

impl Headroom {
    /// Without a watermark, ready means any slack at all. With a watermark
    /// `w`, ready means `primary_inflight <= effective_max - w` (never ready
    /// when `w > effective_max`).
    pub(super) fn compute(
        effective_max: usize,
        primary_inflight: usize,
        low_watermark: Option<usize>,
    ) -> Self {
        let available = effective_max.saturating_sub(primary_inflight);
        let ready = match low_watermark {
            None => available > 0,
            Some(w) => primary_inflight.saturating_add(w) <= effective_max,
        };
        Self {
            effective_max,
            primary_inflight,
            available,
            ready,
        }
    }
}
