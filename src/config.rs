//! Monitor configuration: defaults, validation, and JSON persistence.
//!
//! Every field is optional when deserializing; unspecified fields keep
//! their defaults (a shallow override, matching the construction contract).
//! Unknown fields are ignored.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::Path;

/// Tuning parameters for a [`PerformanceMonitor`](crate::PerformanceMonitor).
///
/// Immutable for the monitor's lifetime.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    /// Lowest performance level.
    pub min: i32,
    /// Highest performance level.
    pub max: i32,
    /// Initial performance level.
    pub start: i32,
    /// Number of frame-time samples per averaging window.
    pub samples: usize,
    /// Minimum accumulated milliseconds before a sample is taken.
    pub accuracy_ms: f64,
    /// Warm-up after construction/full reset before evaluation starts.
    pub delay_ms: f64,
    /// Fps ceiling used to cap the derived `current_fps`.
    pub max_fps: f64,
    /// Floor threshold: average fps at or below this latches the monitor
    /// into the too-low state.
    pub min_fps: f64,
    /// Fps threshold below which the level is decreased.
    pub check_fps: f64,
    /// Fps threshold above which the level may increase.
    pub upper_check_fps: f64,
    /// Budget of failed upward attempts before raises are throttled.
    pub max_try_to_upper: u32,
    /// Period after which accumulated smoothing state is soft-reset.
    /// `None` disables periodic re-checks.
    pub re_check_after_ms: Option<f64>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            min: -2,
            max: 3,
            start: 0,
            samples: 30,
            accuracy_ms: 96.0,
            delay_ms: 1000.0,
            max_fps: 60.0,
            min_fps: 30.0,
            check_fps: 55.0,
            upper_check_fps: 58.0,
            max_try_to_upper: 3,
            re_check_after_ms: Some(60_000.0),
        }
    }
}

impl MonitorConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::Validation(format!(
                "min ({}) cannot be greater than max ({})",
                self.min, self.max
            )));
        }

        if self.start < self.min || self.start > self.max {
            return Err(ConfigError::Validation(format!(
                "start ({}) must lie within [{}, {}]",
                self.start, self.min, self.max
            )));
        }

        if self.samples == 0 {
            return Err(ConfigError::Validation(
                "samples must be at least 1".to_string(),
            ));
        }

        if self.min_fps <= 0.0 {
            return Err(ConfigError::Validation(format!(
                "min_fps ({}) must be positive",
                self.min_fps
            )));
        }

        if self.max_fps < self.min_fps {
            return Err(ConfigError::Validation(format!(
                "max_fps ({}) cannot be below min_fps ({})",
                self.max_fps, self.min_fps
            )));
        }

        if self.check_fps > self.upper_check_fps {
            return Err(ConfigError::Validation(format!(
                "check_fps ({}) cannot exceed upper_check_fps ({})",
                self.check_fps, self.upper_check_fps
            )));
        }

        Ok(())
    }

    /// Parse a configuration from a JSON string, merged over defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigError::Parse(format!("Invalid JSON: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, or use defaults if it doesn't exist.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .map_err(|e| ConfigError::Parse(format!("Failed to read config file: {}", e)))?;
            Self::from_json(&contents)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a file using an atomic write.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Atomic write: write to temp file, then rename
        let temp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))?;

        {
            let mut file = fs::File::create(&temp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }

        fs::rename(&temp_path, path)?;

        Ok(())
    }
}
