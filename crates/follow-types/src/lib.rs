//! `follow-types` – shared vocabulary of the person-follower stack.
//!
//! Perception produces [`DetectionEvent`]s, the decision engine turns them
//! into [`MotionCommand`]s, and the HAL forwards those to the motors.  Every
//! crate in the workspace speaks in these types.

pub mod config;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use config::{BrainConfig, ConfigError, ZoneBands};

/// Discrete lateral position of the target in the camera frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Zone {
    Left,
    Center,
    Right,
}

impl Zone {
    /// All zones in tie-break order.
    pub const ALL: [Zone; 3] = [Zone::Left, Zone::Center, Zone::Right];

    pub fn as_str(&self) -> &'static str {
        match self {
            Zone::Left => "LEFT",
            Zone::Center => "CENTER",
            Zone::Right => "RIGHT",
        }
    }
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Zone {
    type Err = FollowError;

    /// Parse a zone tag case-insensitively (`"left"`, `"CENTER"`, …).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LEFT" => Ok(Zone::Left),
            "CENTER" => Ok(Zone::Center),
            "RIGHT" => Ok(Zone::Right),
            other => Err(FollowError::UnknownZone(other.to_string())),
        }
    }
}

/// Axis-aligned bounding box in original-frame pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl Rect {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Horizontal extent `x2 - x1` (zero for inverted boxes).  Any pair of
    /// `i32` edges fits, so saturated detector boxes never overflow.
    pub fn width(&self) -> u32 {
        extent(self.x1, self.x2)
    }

    pub fn height(&self) -> u32 {
        extent(self.y1, self.y2)
    }
}

fn extent(lo: i32, hi: i32) -> u32 {
    u32::try_from((i64::from(hi) - i64::from(lo)).max(0)).unwrap_or(u32::MAX)
}

/// Result of running the detector on one frame.
///
/// Build with [`DetectionEvent::found`] or [`DetectionEvent::miss`] so that
/// `found == false` always implies `zone == None && bbox == None`.  The fields
/// stay public because events also arrive from logs and other processes,
/// where the invariant can be broken; the decision engine treats such events
/// as malformed rather than trusting them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    pub found: bool,
    pub zone: Option<Zone>,
    pub bbox: Option<Rect>,
    /// Detector score in `[0, 1]`; meaningful only when `found`.
    pub confidence: f32,
}

impl DetectionEvent {
    /// A person was detected at `bbox`, classified into `zone`.
    pub fn found(bbox: Rect, zone: Zone, confidence: f32) -> Self {
        Self {
            found: true,
            zone: Some(zone),
            bbox: Some(bbox),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// No person in this frame (or the detector was skipped).
    pub fn miss() -> Self {
        Self {
            found: false,
            zone: None,
            bbox: None,
            confidence: 0.0,
        }
    }

    /// `true` when the event honours the `found ⇔ zone/bbox present` rule.
    pub fn is_consistent(&self) -> bool {
        if self.found {
            self.zone.is_some()
        } else {
            self.zone.is_none() && self.bbox.is_none()
        }
    }
}

/// Closed set of reasons a [`MotionCommand`] was produced.
///
/// The label doubles as the change-detection key for edge-triggered command
/// application: the same decision always yields the same label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandLabel {
    FollowCenter,
    FollowLeft,
    FollowRight,
    ZoneError,
    MemoryLeft,
    MemoryRight,
    MemoryCenter,
    SearchSpin,
}

impl CommandLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandLabel::FollowCenter => "follow_center",
            CommandLabel::FollowLeft => "follow_left",
            CommandLabel::FollowRight => "follow_right",
            CommandLabel::ZoneError => "zone_error",
            CommandLabel::MemoryLeft => "memory_left",
            CommandLabel::MemoryRight => "memory_right",
            CommandLabel::MemoryCenter => "memory_center",
            CommandLabel::SearchSpin => "search_spin",
        }
    }
}

impl fmt::Display for CommandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Differential wheel command emitted by the decision engine.
///
/// Speeds are not clamped here; the motor driver clamps to its hardware range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotionCommand {
    pub left_speed: i32,
    pub right_speed: i32,
    pub label: CommandLabel,
}

impl MotionCommand {
    pub fn new(left_speed: i32, right_speed: i32, label: CommandLabel) -> Self {
        Self {
            left_speed,
            right_speed,
            label,
        }
    }
}

/// Error type shared by the hardware, perception and runtime crates.
#[derive(Error, Debug)]
pub enum FollowError {
    #[error("Hardware Fault on {component}: {details}")]
    HardwareFault { component: String, details: String },

    #[error("Detector Error: {0}")]
    DetectorFailed(String),

    #[error("Unknown zone tag: {0:?}")]
    UnknownZone(String),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_parses_case_insensitively() {
        assert_eq!("left".parse::<Zone>().unwrap(), Zone::Left);
        assert_eq!(" CENTER ".parse::<Zone>().unwrap(), Zone::Center);
        assert_eq!("Right".parse::<Zone>().unwrap(), Zone::Right);
        assert!(matches!(
            "UP".parse::<Zone>(),
            Err(FollowError::UnknownZone(tag)) if tag == "UP"
        ));
    }

    #[test]
    fn zone_serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Zone::Center).unwrap(), "\"CENTER\"");
        let z: Zone = serde_json::from_str("\"LEFT\"").unwrap();
        assert_eq!(z, Zone::Left);
    }

    #[test]
    fn miss_event_is_consistent() {
        let ev = DetectionEvent::miss();
        assert!(!ev.found);
        assert!(ev.zone.is_none());
        assert!(ev.bbox.is_none());
        assert!(ev.is_consistent());
    }

    #[test]
    fn found_event_clamps_confidence() {
        let ev = DetectionEvent::found(Rect::new(0, 0, 10, 10), Zone::Left, 1.7);
        assert!(ev.is_consistent());
        assert!((ev.confidence - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn found_without_zone_is_inconsistent() {
        let ev = DetectionEvent {
            found: true,
            zone: None,
            bbox: Some(Rect::new(0, 0, 1, 1)),
            confidence: 0.9,
        };
        assert!(!ev.is_consistent());
    }

    #[test]
    fn command_labels_are_snake_case() {
        assert_eq!(CommandLabel::SearchSpin.to_string(), "search_spin");
        assert_eq!(
            serde_json::to_string(&CommandLabel::MemoryCenter).unwrap(),
            "\"memory_center\""
        );
    }

    #[test]
    fn rect_width_never_negative() {
        assert_eq!(Rect::new(10, 0, 4, 5).width(), 0);
        assert_eq!(Rect::new(4, 0, 10, 5).width(), 6);
        assert_eq!(Rect::new(4, 0, 10, 5).height(), 5);
        let huge = Rect::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX);
        assert_eq!(huge.width(), u32::MAX);
        assert_eq!(huge.height(), u32::MAX);
    }

    #[test]
    fn follow_error_display() {
        let err = FollowError::HardwareFault {
            component: "motor_driver".to_string(),
            details: "serial timeout".to_string(),
        };
        assert!(err.to_string().contains("motor_driver"));

        let err = FollowError::from(ConfigError::ZeroHistoryCapacity);
        assert!(err.to_string().contains("Invalid configuration"));
    }
}
