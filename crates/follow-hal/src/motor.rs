//! Generic `MotorDriver` trait for differential-drive bases.
//!
//! The decision engine emits unbounded signed wheel speeds; bounding them to
//! what the motor controller accepts is the driver's job.  Every driver must
//! pass its speeds through [`clamp_speed`] before they reach the wire.

use follow_types::{FollowError, MotionCommand};

/// Largest speed magnitude accepted by the motor controller.
pub const MAX_SPEED: i32 = 99;

/// Clamp a wheel speed to `[-MAX_SPEED, MAX_SPEED]`.
pub fn clamp_speed(speed: i32) -> i32 {
    speed.clamp(-MAX_SPEED, MAX_SPEED)
}

/// A two-wheel (or two-side) drive base.
///
/// Implementations must be cheap to call at loop rate and must report
/// transient hardware problems as errors rather than panicking; the control
/// loop logs them and keeps going.
pub trait MotorDriver: Send {
    /// Stable identifier for this driver, e.g. `"drive_base"`.
    fn id(&self) -> &str;

    /// Drive the left and right wheels at the command's speeds, clamped to
    /// the hardware range.
    ///
    /// # Errors
    ///
    /// Returns [`FollowError::HardwareFault`] if the command could not be
    /// delivered (e.g. the serial link dropped a write).
    fn apply(&mut self, command: &MotionCommand) -> Result<(), FollowError>;

    /// Bring all wheels to zero speed.
    ///
    /// # Errors
    ///
    /// Returns [`FollowError::HardwareFault`] if the stop could not be
    /// delivered.
    fn stop(&mut self) -> Result<(), FollowError>;
}
