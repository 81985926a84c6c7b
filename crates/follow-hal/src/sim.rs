//! In-process simulated drivers for headless runs and tests.
//!
//! [`SimMotorDriver`] records every command it receives in a shared
//! [`MotorLog`] and logs it, which is also how the CLI runs when no robot is
//! attached ("dry mode").  [`SimCamera`] serves blank frames of a fixed
//! geometry.
//!
//! # Example
//!
//! ```rust
//! use follow_hal::{MotorDriver, MotorRecord, SimMotorDriver};
//! use follow_types::{CommandLabel, MotionCommand};
//!
//! let mut driver = SimMotorDriver::new("drive_base");
//! let log = driver.log();
//!
//! driver
//!     .apply(&MotionCommand::new(13, 13, CommandLabel::FollowCenter))
//!     .expect("sim apply must succeed");
//! driver.stop().expect("sim stop must succeed");
//!
//! assert_eq!(log.stop_count(), 1);
//! assert!(matches!(log.records()[0], MotorRecord::Applied { left: 13, right: 13, .. }));
//! ```

use std::sync::{Arc, Mutex, MutexGuard};

use follow_types::{CommandLabel, FollowError, MotionCommand};
use tracing::info;

use crate::camera::{Camera, CameraFrame};
use crate::motor::{MotorDriver, clamp_speed};

// ────────────────────────────────────────────────────────────────────────────
// Motor log
// ────────────────────────────────────────────────────────────────────────────

/// One call received by a [`SimMotorDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorRecord {
    /// `apply` succeeded with these clamped speeds.
    Applied {
        left: i32,
        right: i32,
        label: CommandLabel,
    },
    /// `stop` was called.
    Stopped,
}

/// Cloneable handle onto the records of a [`SimMotorDriver`].
///
/// The driver itself is usually moved into a control loop, so tests keep a
/// `MotorLog` to inspect what reached the "hardware".
#[derive(Debug, Clone, Default)]
pub struct MotorLog {
    records: Arc<Mutex<Vec<MotorRecord>>>,
}

impl MotorLog {
    fn lock(&self) -> MutexGuard<'_, Vec<MotorRecord>> {
        // A poisoned log only means a test thread panicked mid-push; the
        // records themselves are still usable.
        self.records.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn push(&self, record: MotorRecord) {
        self.lock().push(record);
    }

    /// Snapshot of every record so far, oldest first.
    pub fn records(&self) -> Vec<MotorRecord> {
        self.lock().clone()
    }

    /// Number of successful `apply` calls.
    pub fn apply_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|r| matches!(r, MotorRecord::Applied { .. }))
            .count()
    }

    /// Number of `stop` calls.
    pub fn stop_count(&self) -> usize {
        self.lock()
            .iter()
            .filter(|r| matches!(r, MotorRecord::Stopped))
            .count()
    }

    /// The most recent record, if any.
    pub fn last(&self) -> Option<MotorRecord> {
        self.lock().last().copied()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sim motor driver
// ────────────────────────────────────────────────────────────────────────────

/// A simulated drive base.  Clamps speeds like real hardware would and
/// records them in a [`MotorLog`].
pub struct SimMotorDriver {
    id: String,
    log: MotorLog,
    failures_pending: usize,
}

impl SimMotorDriver {
    /// Create a new simulated driver with the given identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            log: MotorLog::default(),
            failures_pending: 0,
        }
    }

    /// Make the next `count` calls to `apply` fail with a hardware fault,
    /// mimicking a flaky serial link.
    pub fn fail_next_applies(mut self, count: usize) -> Self {
        self.failures_pending = count;
        self
    }

    /// Handle onto this driver's records.
    pub fn log(&self) -> MotorLog {
        self.log.clone()
    }
}

impl MotorDriver for SimMotorDriver {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, command: &MotionCommand) -> Result<(), FollowError> {
        if self.failures_pending > 0 {
            self.failures_pending -= 1;
            return Err(FollowError::HardwareFault {
                component: self.id.clone(),
                details: "simulated write failure".to_string(),
            });
        }
        let left = clamp_speed(command.left_speed);
        let right = clamp_speed(command.right_speed);
        info!(driver = %self.id, left, right, label = %command.label, "motor command");
        self.log.push(MotorRecord::Applied {
            left,
            right,
            label: command.label,
        });
        Ok(())
    }

    fn stop(&mut self) -> Result<(), FollowError> {
        info!(driver = %self.id, "motor stop");
        self.log.push(MotorRecord::Stopped);
        Ok(())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sim camera
// ────────────────────────────────────────────────────────────────────────────

/// A simulated camera that returns blank frames of a fixed size.
pub struct SimCamera {
    id: String,
    width: u32,
    height: u32,
    captured: u64,
}

impl SimCamera {
    /// Create a simulated BGR24 camera producing `width × height` frames.
    pub fn new(id: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            id: id.into(),
            width,
            height,
            captured: 0,
        }
    }

    /// Number of frames captured so far.
    pub fn captured(&self) -> u64 {
        self.captured
    }
}

impl Camera for SimCamera {
    fn id(&self) -> &str {
        &self.id
    }

    fn capture(&mut self) -> Result<CameraFrame, FollowError> {
        self.captured += 1;
        Ok(CameraFrame::blank(self.width, self.height, 3))
    }
}
