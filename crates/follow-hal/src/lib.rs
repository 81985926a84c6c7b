//! `follow-hal` – Hardware Abstraction Layer.
//!
//! The decision engine never talks to a serial port or a V4L2 device
//! directly.  It hands [`MotionCommand`][follow_types::MotionCommand]s to a
//! [`MotorDriver`][motor::MotorDriver] and receives frames from a
//! [`Camera`][camera::Camera]; drivers can be swapped without touching the
//! control logic.
//!
//! # Modules
//!
//! - [`motor`] – [`MotorDriver`][motor::MotorDriver]: the actuator adapter
//!   contract (`apply` / `stop`) plus [`clamp_speed`][motor::clamp_speed].
//! - [`camera`] – [`Camera`][camera::Camera] and
//!   [`CameraFrame`][camera::CameraFrame].
//! - [`sim`] – in-process drivers that record commands and serve blank
//!   frames, so the full stack runs in tests and on machines without a robot.

pub mod camera;
pub mod motor;
pub mod sim;

pub use camera::{Camera, CameraFrame};
pub use motor::{MAX_SPEED, MotorDriver, clamp_speed};
pub use sim::{MotorLog, MotorRecord, SimCamera, SimMotorDriver};
