//! Adaptive performance-level estimation from frame timings.
//!
//! This crate estimates a running application's rendering performance from
//! frame-interval samples and emits a coarse discrete "performance level"
//! the host can use to scale rendering quality (shader iteration counts,
//! particle budgets, resolution scale).
//!
//! The [`PerformanceMonitor`] is driven once per animation frame. It keeps
//! a batch window of recent frame durations; when the window fills, the
//! mean frame time is mapped through a hysteretic classifier into an
//! integer level in `[min, max]`, and change listeners fire when the level
//! moves. Asymmetric thresholds (raising the downward check after an
//! upward move) and a failed-raise budget prevent the level from flapping
//! when fps hovers near a boundary.
//!
//! ```no_run
//! use perf_fps::{MonitorConfig, PerformanceMonitor};
//!
//! let mut monitor = PerformanceMonitor::new(MonitorConfig::default())?;
//! monitor.on_change(|level| {
//!     println!("performance level is now {level}");
//! });
//!
//! // Once per animation frame:
//! monitor.update();
//! // ... render using monitor.current_level() ...
//! # Ok::<(), perf_fps::ConfigError>(())
//! ```
//!
//! Time and visibility are injected: the monitor consults a [`Clock`] and
//! subscribes to a [`VisibilitySignal`] so that time spent backgrounded is
//! never misread as a slow frame. Hosts without either use the defaults
//! ([`clock::SystemClock`], [`visibility::NullVisibility`]).
//!
//! The monitor raises no errors at runtime; it degrades gracefully
//! instead (see [`PerformanceMonitor::is_too_low`]). The only fallible
//! surface is configuration ([`ConfigError`]).

pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod monitor;
pub mod visibility;

pub use clock::Clock;
pub use config::MonitorConfig;
pub use error::ConfigError;
pub use events::ListenerHandle;
pub use metrics::MetricsSnapshot;
pub use monitor::{fps_to_ms, ms_to_fps, PerformanceMonitor};
pub use visibility::{VisibilitySignal, VisibilityToken};
