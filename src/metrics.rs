//! Diagnostic counters for the monitor.
//!
//! Tracks evaluation and transition counts for host introspection/UI.
//! The monitor is single-threaded, so these are plain counters maintained
//! inline; a serializable snapshot is exposed via
//! [`PerformanceMonitor::metrics`](crate::PerformanceMonitor::metrics).

use serde::{Deserialize, Serialize};

/// Metrics snapshot exposed to hosts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Completed averaging-window evaluations since the last full reset.
    pub evaluations: u64,
    /// Level transitions emitted (raises + drops + floor hits that moved
    /// the level).
    pub level_changes: u64,
    /// Upward level moves.
    pub raises: u64,
    /// Downward level moves.
    pub drops: u64,
    /// Times the floor latch was tripped.
    pub floor_hits: u64,
    /// Periodic soft resets performed via `re_check_after`.
    pub soft_resets: u64,
    /// Upward moves since the last reset (mirrors the classifier's
    /// hysteresis state).
    pub upper: u32,
    /// Failed-upward counter throttling future raises.
    pub fail_increment: u32,
    /// Milliseconds since construction or the last full reset.
    pub uptime_ms: f64,
}

/// Running counters owned by the monitor.
#[derive(Debug, Clone, Default)]
pub(crate) struct MetricsCounters {
    pub(crate) evaluations: u64,
    pub(crate) level_changes: u64,
    pub(crate) raises: u64,
    pub(crate) drops: u64,
    pub(crate) floor_hits: u64,
    pub(crate) soft_resets: u64,
}

impl MetricsCounters {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_raise(&mut self) {
        self.raises += 1;
    }

    pub(crate) fn record_drop(&mut self) {
        self.drops += 1;
    }

    pub(crate) fn record_floor_hit(&mut self) {
        self.floor_hits += 1;
    }

    pub(crate) fn record_soft_reset(&mut self) {
        self.soft_resets += 1;
    }

    pub(crate) fn record_evaluation(&mut self) {
        self.evaluations += 1;
    }

    pub(crate) fn record_level_change(&mut self) {
        self.level_changes += 1;
    }
}
