//! [`ControlLoop`] – frame → detector → brain → motors.
//!
//! Each [`tick`][ControlLoop::tick] takes the newest frame from the
//! [`FrameMailbox`], runs the detector on it, feeds the event and the current
//! time into the [`Brain`] and hands the resulting command to the motor
//! driver.
//!
//! # Edge-triggered application
//!
//! A command is sent to the motors only when its label differs from the
//! label of the last command that was *successfully* applied.  A command
//! whose `apply` failed is therefore retried on the next tick that produces
//! the same label.
//!
//! # Shutdown
//!
//! [`shutdown`][ControlLoop::shutdown] issues exactly one `stop` to the
//! motors, however many times it is called.  Dropping the loop calls it too,
//! so the drive base is stopped on every exit path including panics that
//! unwind through the owner.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use follow_hal::MotorDriver;
use follow_perception::Detector;
use follow_types::{CommandLabel, DetectionEvent, MotionCommand};
use tracing::{debug, info, warn};

use crate::brain::Brain;
use crate::clock::{Clock, Timestamp};
use crate::mailbox::FrameMailbox;

const RATE_WINDOW: Duration = Duration::from_secs(1);

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// The detection the brain was fed (a miss when the detector failed).
    pub event: DetectionEvent,
    /// The command the brain produced.
    pub command: MotionCommand,
    /// `true` when the command was sent to the motors and accepted.
    pub applied: bool,
}

/// Counts ticks and logs the rate once per window.
#[derive(Debug, Default)]
struct RateMeter {
    window_start: Option<Timestamp>,
    ticks: u32,
}

impl RateMeter {
    fn record(&mut self, now: Timestamp) {
        self.ticks += 1;
        let start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_sub(start);
        if elapsed >= RATE_WINDOW {
            let fps = f64::from(self.ticks) / elapsed.as_secs_f64();
            debug!(fps, ticks = self.ticks, "control loop rate");
            self.window_start = Some(now);
            self.ticks = 0;
        }
    }
}

/// Owns every piece of the pipeline downstream of the camera.
pub struct ControlLoop {
    brain: Brain,
    detector: Box<dyn Detector>,
    motors: Box<dyn MotorDriver>,
    clock: Box<dyn Clock>,
    frames: FrameMailbox,
    loop_sleep: Duration,
    last_applied: Option<CommandLabel>,
    stopped: bool,
    rate: RateMeter,
}

impl ControlLoop {
    pub fn new(
        brain: Brain,
        detector: Box<dyn Detector>,
        motors: Box<dyn MotorDriver>,
        clock: Box<dyn Clock>,
        frames: FrameMailbox,
    ) -> Self {
        Self {
            brain,
            detector,
            motors,
            clock,
            frames,
            loop_sleep: Duration::from_millis(10),
            last_applied: None,
            stopped: false,
            rate: RateMeter::default(),
        }
    }

    /// Pause between iterations of [`run`][Self::run].
    pub fn with_loop_sleep(mut self, loop_sleep: Duration) -> Self {
        self.loop_sleep = loop_sleep;
        self
    }

    pub fn brain(&self) -> &Brain {
        &self.brain
    }

    /// Label of the last command the motors accepted.
    pub fn last_applied(&self) -> Option<CommandLabel> {
        self.last_applied
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Process the newest frame, if any.
    ///
    /// Returns `None` when no new frame is waiting or the loop has been shut
    /// down.  Detector failures are logged and treated as a miss.
    pub fn tick(&mut self) -> Option<TickReport> {
        if self.stopped {
            return None;
        }
        let frame = self.frames.take()?;

        let event = self.detector.detect(&frame).unwrap_or_else(|e| {
            warn!(error = %e, "detection failed; treating frame as a miss");
            DetectionEvent::miss()
        });

        let now = self.clock.now();
        let command = self.brain.update(&event, now);
        let applied = self.apply_if_changed(&command);
        self.rate.record(now);

        Some(TickReport {
            event,
            command,
            applied,
        })
    }

    fn apply_if_changed(&mut self, command: &MotionCommand) -> bool {
        if self.last_applied == Some(command.label) {
            return false;
        }
        match self.motors.apply(command) {
            Ok(()) => {
                info!(
                    label = %command.label,
                    left = command.left_speed,
                    right = command.right_speed,
                    "motion command applied"
                );
                self.last_applied = Some(command.label);
                true
            }
            Err(e) => {
                warn!(
                    motors = self.motors.id(),
                    label = %command.label,
                    error = %e,
                    "motion command rejected; will retry"
                );
                false
            }
        }
    }

    /// Tick until `running` is cleared, then shut down.
    pub fn run(&mut self, running: &AtomicBool) -> u64 {
        self.run_until(running, None)
    }

    /// Tick until `running` is cleared or `max_ticks` frames have been
    /// processed, then shut down.  Returns the number of processed frames.
    pub fn run_until(&mut self, running: &AtomicBool, max_ticks: Option<u64>) -> u64 {
        info!(motors = self.motors.id(), "control loop started");
        let mut processed = 0u64;
        while running.load(Ordering::SeqCst) && max_ticks.is_none_or(|max| processed < max) {
            if self.tick().is_some() {
                processed += 1;
            }
            if self.loop_sleep.is_zero() {
                thread::yield_now();
            } else {
                thread::sleep(self.loop_sleep);
            }
        }
        info!(processed, "control loop finished");
        self.shutdown();
        processed
    }

    /// Stop the motors.  Only the first call reaches the driver.
    pub fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        match self.motors.stop() {
            Ok(()) => info!(motors = self.motors.id(), "motors stopped"),
            Err(e) => warn!(motors = self.motors.id(), error = %e, "motor stop failed"),
        }
    }
}

impl Drop for ControlLoop {
    fn drop(&mut self) {
        self.shutdown();
    }
}
