//! Monotonic clock abstraction.
//!
//! The monitor never reads wall-clock time directly; it consults an
//! injected [`Clock`]. Hosts running under a real frame loop use
//! [`SystemClock`]; tests and simulations drive a [`ManualClock`].

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Source of monotonic timestamps.
pub trait Clock {
    /// Current instant. Must be monotonic non-decreasing.
    fn now(&self) -> Instant;
}

/// Real monotonic clock backed by [`Instant::now`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Manually stepped clock for deterministic tests and simulations.
///
/// Clone handles share the same underlying time; advancing one advances
/// all of them.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
}

impl ManualClock {
    /// Create a clock pinned at the current instant.
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    /// Move time forward.
    pub fn advance(&self, delta: Duration) {
        self.now.set(self.now.get() + delta);
    }

    /// Move time forward by fractional milliseconds.
    pub fn advance_ms(&self, ms: f64) {
        self.advance(Duration::from_secs_f64(ms / 1000.0));
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }
}
