//! Tunables for the zone classifier and the decision engine.
//!
//! Both structs deserialize with per-field defaults so a partial TOML table
//! only needs to name what it changes.  Call [`BrainConfig::validate`] once at
//! startup; the runtime assumes a validated config afterwards.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance used when checking that the band ratios sum to one.
const RATIO_SUM_TOLERANCE: f64 = 1e-6;

/// Configuration rejected at startup.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error(
        "turn_delta ({turn_delta}) must be smaller than base_speed ({base_speed}); set allow_wheel_reversal to permit wheels spinning backwards while following"
    )]
    TurnDeltaTooLarge { base_speed: i32, turn_delta: i32 },

    #[error("{field} must be positive, got {value}")]
    NonPositiveSpeed { field: &'static str, value: i32 },

    #[error("turn_delta must not be negative, got {0}")]
    NegativeTurnDelta(i32),

    #[error("zone band ratios must sum to 1.0, got {0}")]
    ZoneRatiosDoNotSumToOne(f64),

    #[error("zone band ratio {field} must be positive, got {value}")]
    NonPositiveZoneRatio { field: &'static str, value: f64 },

    #[error("zone_history_capacity must be at least 1")]
    ZeroHistoryCapacity,

    #[error("{field} must be a finite, non-negative number of seconds, got {value}")]
    InvalidDuration { field: &'static str, value: f64 },

    #[error("memory_center_scale must lie in [0, 1], got {0}")]
    InvalidScale(f32),

    #[error("detect_every_n_frames must be at least 1")]
    ZeroDetectInterval,
}

// ────────────────────────────────────────────────────────────────────────────
// ZoneBands
// ────────────────────────────────────────────────────────────────────────────

/// Horizontal split of the frame into LEFT | CENTER | RIGHT bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoneBands {
    pub left_ratio: f64,
    pub center_ratio: f64,
    pub right_ratio: f64,
}

impl Default for ZoneBands {
    fn default() -> Self {
        Self {
            left_ratio: 0.35,
            center_ratio: 0.30,
            right_ratio: 0.35,
        }
    }
}

impl ZoneBands {
    /// Check that every ratio is positive and that they sum to 1.0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("left_ratio", self.left_ratio),
            ("center_ratio", self.center_ratio),
            ("right_ratio", self.right_ratio),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveZoneRatio { field, value });
            }
        }
        let sum = self.left_ratio + self.center_ratio + self.right_ratio;
        if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
            return Err(ConfigError::ZoneRatiosDoNotSumToOne(sum));
        }
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// BrainConfig
// ────────────────────────────────────────────────────────────────────────────

/// Parameters of the decision engine, passed in at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrainConfig {
    /// Forward speed of both wheels when the target is centred.
    pub base_speed: i32,
    /// Speed added to one wheel and removed from the other when turning.
    pub turn_delta: i32,
    /// Wheel speed magnitude used while spinning in place to search.
    pub search_spin_speed: i32,
    /// How long the last known direction is kept after losing the target.
    pub memory_seconds: f64,
    /// Number of raw zone observations used for the majority vote.
    pub zone_history_capacity: usize,
    /// Minimum dwell time between two accepted stable-zone changes.
    pub flicker_guard_seconds: f64,
    /// Fraction of `base_speed` used when coasting on a remembered CENTER.
    pub memory_center_scale: f32,
    /// Permit `turn_delta >= base_speed`, i.e. the inner wheel reversing.
    pub allow_wheel_reversal: bool,
    /// Forget the zone history on entering search, so a reacquired target is
    /// not biased by votes cast before it was lost.
    pub reset_history_on_search: bool,
    pub bands: ZoneBands,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            base_speed: 13,
            turn_delta: 10,
            search_spin_speed: 10,
            memory_seconds: 0.8,
            zone_history_capacity: 5,
            flicker_guard_seconds: 0.2,
            memory_center_scale: 0.7,
            allow_wheel_reversal: false,
            reset_history_on_search: false,
            bands: ZoneBands::default(),
        }
    }
}

impl BrainConfig {
    /// Reject configurations that would make the robot misbehave at runtime.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.base_speed <= 0 {
            return Err(ConfigError::NonPositiveSpeed {
                field: "base_speed",
                value: self.base_speed,
            });
        }
        if self.search_spin_speed <= 0 {
            return Err(ConfigError::NonPositiveSpeed {
                field: "search_spin_speed",
                value: self.search_spin_speed,
            });
        }
        if self.turn_delta < 0 {
            return Err(ConfigError::NegativeTurnDelta(self.turn_delta));
        }
        if self.turn_delta >= self.base_speed && !self.allow_wheel_reversal {
            return Err(ConfigError::TurnDeltaTooLarge {
                base_speed: self.base_speed,
                turn_delta: self.turn_delta,
            });
        }
        if self.zone_history_capacity == 0 {
            return Err(ConfigError::ZeroHistoryCapacity);
        }
        for (field, value) in [
            ("memory_seconds", self.memory_seconds),
            ("flicker_guard_seconds", self.flicker_guard_seconds),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::InvalidDuration { field, value });
            }
        }
        if !(0.0..=1.0).contains(&self.memory_center_scale) {
            return Err(ConfigError::InvalidScale(self.memory_center_scale));
        }
        self.bands.validate()
    }

    pub fn memory_window(&self) -> Duration {
        Duration::try_from_secs_f64(self.memory_seconds).unwrap_or(Duration::ZERO)
    }

    pub fn flicker_guard(&self) -> Duration {
        Duration::try_from_secs_f64(self.flicker_guard_seconds).unwrap_or(Duration::ZERO)
    }
}
