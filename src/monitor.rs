//! The adaptive performance classifier.
//!
//! [`PerformanceMonitor`] converts a stream of per-frame timestamps into a
//! smoothed, hysteresis-controlled discrete quality level and notifies
//! listeners of level transitions. It is driven externally, once per frame,
//! by the host's render loop; every operation is synchronous and runs to
//! completion before returning.
//!
//! The classifier is biased toward stability: after an upward move the
//! downward-check threshold is raised to `upper_check_fps`, so the level
//! must clear a higher bar to stay up, and repeated failed raises are
//! throttled via `max_try_to_upper`.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::MonitorConfig;
use crate::error::ConfigError;
use crate::events::{ListenerHandle, ListenerSet};
use crate::metrics::{MetricsCounters, MetricsSnapshot};
use crate::visibility::{NullVisibility, VisibilitySignal, VisibilityToken};

/// Convert frames per second to a frame duration in milliseconds.
pub fn fps_to_ms(fps: f64) -> f64 {
    (1.0 / fps) * 1000.0
}

/// Convert a frame duration in milliseconds to frames per second.
pub fn ms_to_fps(ms: f64) -> f64 {
    1000.0 / ms
}

/// Latest visibility state, written by the signal callback and consumed
/// lazily on the next `update()` so the core stays single-threaded.
struct VisibilityState {
    hidden: Cell<bool>,
    dirty: Cell<bool>,
}

/// Frame-interval sampler and hysteretic performance classifier.
///
/// Call [`update`](Self::update) once per animation frame. When a full
/// averaging window has accumulated, the mean frame time is classified
/// into an integer level in `[config.min, config.max]` and registered
/// change listeners are invoked if the level moved.
pub struct PerformanceMonitor {
    config: MonitorConfig,
    clock: Rc<dyn Clock>,
    visibility: Rc<dyn VisibilitySignal>,
    visibility_state: Rc<VisibilityState>,
    visibility_token: Option<VisibilityToken>,
    listeners: ListenerSet,
    metrics: MetricsCounters,

    /// Time origin; all millisecond timestamps are relative to this.
    origin: Instant,
    /// Timestamp of the previous `update()` call, ms since origin.
    prev_ms: f64,
    /// Duration of the most recent frame.
    last_frame_ms: f64,
    /// Milliseconds accumulated toward the next sample.
    accumulated_ms: f64,
    /// Batch window of recent frame durations; cleared after evaluation.
    window: Vec<f64>,
    /// Mean of the last completed window.
    average_ms: f64,
    level: i32,
    previous_level: i32,
    /// Downward-check threshold; starts at `check_fps`, raised to
    /// `upper_check_fps` after an upward move.
    check_current_fps: f64,
    /// Upward moves since the last reset.
    upper: u32,
    /// Downward moves that followed an upward move; gates further raises.
    fail_increment: u32,
    /// Floor latch. Once set, sampling stops until a full reset.
    too_low: bool,
    /// True while the host is hidden.
    suspended: bool,
    /// Warm-up deadline, ms since origin; frames before it are not sampled.
    delay_deadline_ms: f64,
    /// Next periodic soft-reset deadline, ms since origin.
    re_check_deadline_ms: Option<f64>,
    /// Start of the current session (construction or last full reset).
    started_ms: f64,
}

impl PerformanceMonitor {
    /// Create a monitor driven by the system clock, with no visibility
    /// signal.
    ///
    /// Fails if the configuration is inconsistent (for example
    /// `min > max`).
    pub fn new(config: MonitorConfig) -> Result<Self, ConfigError> {
        Self::with_platform(config, Rc::new(SystemClock), Rc::new(NullVisibility))
    }

    /// Create a monitor with an injected clock and visibility signal.
    ///
    /// The monitor subscribes to `visibility` and releases the
    /// subscription in [`destroy`](Self::destroy) (or on drop). Visibility
    /// transitions are consumed lazily on the next [`update`](Self::update).
    pub fn with_platform(
        config: MonitorConfig,
        clock: Rc<dyn Clock>,
        visibility: Rc<dyn VisibilitySignal>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let visibility_state = Rc::new(VisibilityState {
            hidden: Cell::new(false),
            dirty: Cell::new(false),
        });

        let callback_state = Rc::clone(&visibility_state);
        let visibility_token = Some(visibility.subscribe(Rc::new(move |hidden| {
            callback_state.hidden.set(hidden);
            callback_state.dirty.set(true);
        })));

        let origin = clock.now();
        let frame_ms = fps_to_ms(config.max_fps);

        Ok(Self {
            origin,
            prev_ms: 0.0,
            last_frame_ms: frame_ms,
            accumulated_ms: 0.0,
            window: Vec::with_capacity(config.samples),
            average_ms: frame_ms,
            level: config.start,
            previous_level: config.start,
            check_current_fps: config.check_fps,
            upper: 0,
            fail_increment: 0,
            too_low: false,
            suspended: false,
            delay_deadline_ms: config.delay_ms,
            re_check_deadline_ms: config.re_check_after_ms,
            started_ms: 0.0,
            config,
            clock,
            visibility,
            visibility_state,
            visibility_token,
            listeners: ListenerSet::new(),
            metrics: MetricsCounters::new(),
        })
    }

    /// Milliseconds since the monitor's time origin.
    fn now_ms(&self) -> f64 {
        self.clock.now().duration_since(self.origin).as_secs_f64() * 1000.0
    }

    /// Per-frame entry point. Call once per animation frame.
    ///
    /// Updates the sample window; when the window fills, re-classifies and
    /// notifies listeners if the level changed. A no-op while the floor
    /// latch is set or the host is hidden.
    pub fn update(&mut self) {
        // Consume any visibility transition reported since the last frame.
        if self.visibility_state.dirty.replace(false) {
            self.pause(self.visibility_state.hidden.get());
        }

        if self.too_low || self.suspended {
            return;
        }

        let now = self.now_ms();
        let frame_ms = now - self.prev_ms;
        self.prev_ms = now;
        self.last_frame_ms = frame_ms;

        // Warm-up: don't classify startup frames.
        if now < self.delay_deadline_ms {
            return;
        }

        self.accumulated_ms += frame_ms;

        if self.accumulated_ms < self.config.accuracy_ms || self.level <= self.config.min {
            return;
        }

        // A zero-duration frame would corrupt the average and read as
        // spuriously fast; skip it outright.
        if frame_ms == 0.0 {
            return;
        }

        if let Some(deadline) = self.re_check_deadline_ms {
            if now > deadline {
                self.reset(true);
                self.re_check_deadline_ms = Some(deadline + now);
                self.metrics.record_soft_reset();
                debug!(at_ms = now, "periodic soft reset");
            }
        }

        self.window.push(frame_ms);

        if self.window.len() >= self.config.samples {
            self.average_ms = self.window.iter().sum::<f64>() / self.window.len() as f64;
            self.metrics.record_evaluation();
            self.classify();
            self.window.clear();
        }

        self.accumulated_ms = 0.0;
    }

    /// Alias for [`update`](Self::update).
    #[inline]
    pub fn tick(&mut self) {
        self.update();
    }

    /// Classify the current window average into a level adjustment.
    ///
    /// At most one step per evaluation. Emits the change event only when
    /// the level actually moved.
    fn classify(&mut self) {
        let avg_fps = ms_to_fps(self.average_ms);
        debug!(
            avg_fps,
            average_ms = self.average_ms,
            level = self.level,
            "window evaluated"
        );

        if avg_fps <= self.config.min_fps {
            self.level = self.config.min;
            self.too_low = true;
            self.metrics.record_floor_hit();
            warn!(avg_fps, min_fps = self.config.min_fps, "performance floor reached");
        } else if avg_fps < self.check_current_fps {
            self.level = (self.level - 1).max(self.config.min);
            if self.upper > 0 {
                self.fail_increment += 1;
            }
            self.check_current_fps = self.config.check_fps;
            self.metrics.record_drop();
        } else if avg_fps > self.config.upper_check_fps
            && self.fail_increment < self.config.max_try_to_upper
            && self.level < self.config.max
        {
            self.upper += 1;
            self.level += 1;
            // Raise the bar for the next downward check so the level must
            // hold a higher fps to stay up.
            self.check_current_fps = self.config.upper_check_fps;
            self.metrics.record_raise();
        }

        if self.level != self.previous_level {
            self.metrics.record_level_change();
            info!(level = self.level, avg_fps, "performance level changed");
            self.listeners.emit(self.level);
        }
        self.previous_level = self.level;
    }

    /// Register a level-change listener, invoked synchronously with the
    /// new level. Returns a handle for [`remove_listener`](Self::remove_listener).
    pub fn on_change(&mut self, callback: impl FnMut(i32) + 'static) -> ListenerHandle {
        self.listeners.add(Box::new(callback))
    }

    /// Unregister a listener. Returns `false` if the handle is unknown.
    pub fn remove_listener(&mut self, handle: ListenerHandle) -> bool {
        self.listeners.remove(handle)
    }

    /// React to a visibility transition: fully reset, then suspend or
    /// resume according to `hidden`.
    ///
    /// Called automatically from [`update`](Self::update) when the
    /// injected signal fired; hosts without a signal call it directly
    /// with their own hidden state.
    pub fn pause(&mut self, hidden: bool) {
        self.reset(false);
        self.suspended = hidden;
        debug!(hidden, "visibility transition");
    }

    /// Reinitialize state.
    ///
    /// `soft` clears the smoothing window, accumulator, and the
    /// upward/failed-upward counters while preserving the current level,
    /// the check threshold, the floor/suspend flags, and all deadlines.
    /// A full reset returns the level to `start`, clears the floor and
    /// suspend flags, re-arms the warm-up delay and re-check deadlines,
    /// and zeroes the diagnostic counters.
    pub fn reset(&mut self, soft: bool) {
        self.upper = 0;
        self.fail_increment = 0;
        self.last_frame_ms = fps_to_ms(self.config.max_fps);
        self.average_ms = self.last_frame_ms;
        self.window.clear();
        self.accumulated_ms = 0.0;

        if !soft {
            let now = self.now_ms();
            self.prev_ms = now;
            self.level = self.config.start;
            self.previous_level = self.config.start;
            self.check_current_fps = self.config.check_fps;
            self.too_low = false;
            self.suspended = false;
            self.delay_deadline_ms = now + self.config.delay_ms;
            self.re_check_deadline_ms = self.config.re_check_after_ms.map(|d| now + d);
            self.started_ms = now;
            self.metrics = MetricsCounters::new();
        }
    }

    /// Release the visibility subscription and drop all listeners.
    ///
    /// The monitor must not be used afterward; also runs on drop.
    pub fn destroy(&mut self) {
        if let Some(token) = self.visibility_token.take() {
            self.visibility.unsubscribe(token);
        }
        self.listeners.clear();
    }

    /// Current classification level.
    pub fn current_level(&self) -> i32 {
        self.level
    }

    /// Alias for [`current_level`](Self::current_level), matching the
    /// "performance" naming some hosts use.
    #[inline]
    pub fn current_performance(&self) -> i32 {
        self.level
    }

    /// Level at the last evaluation.
    pub fn previous_level(&self) -> i32 {
        self.previous_level
    }

    /// Instantaneous fps derived from the last frame, capped at
    /// `config.max_fps`.
    pub fn current_fps(&self) -> f64 {
        ms_to_fps(self.last_frame_ms).min(self.config.max_fps)
    }

    /// Mean frame duration of the last completed window.
    pub fn average_ms(&self) -> f64 {
        self.average_ms
    }

    /// Whether the floor latch is set (average fps fell to `min_fps`).
    pub fn is_too_low(&self) -> bool {
        self.too_low
    }

    /// Whether the host is currently hidden.
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    /// The active downward-check threshold.
    pub fn check_current_fps(&self) -> f64 {
        self.check_current_fps
    }

    /// Samples pending in the current (incomplete) window.
    pub fn pending_samples(&self) -> usize {
        self.window.len()
    }

    /// Number of registered change listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// The configuration this monitor was built with.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Diagnostic counters snapshot.
    pub fn metrics(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            evaluations: self.metrics.evaluations,
            level_changes: self.metrics.level_changes,
            raises: self.metrics.raises,
            drops: self.metrics.drops,
            floor_hits: self.metrics.floor_hits,
            soft_resets: self.metrics.soft_resets,
            upper: self.upper,
            fail_increment: self.fail_increment,
            uptime_ms: self.now_ms() - self.started_ms,
        }
    }
}

impl Drop for PerformanceMonitor {
    fn drop(&mut self) {
        self.destroy();
    }
}

impl std::fmt::Debug for PerformanceMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceMonitor")
            .field("level", &self.level)
            .field("average_ms", &self.average_ms)
            .field("too_low", &self.too_low)
            .field("suspended", &self.suspended)
            .field("pending_samples", &self.window.len())
            .finish()
    }
}
