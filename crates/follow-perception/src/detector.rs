//! The `Detector` seam and frame skipping.
//!
//! Inference is the expensive part of a tick.  [`SkippingDetector`] runs the
//! wrapped detector on every N-th frame only and reports a miss for the
//! frames in between.  The decision engine cannot tell a skipped frame from a
//! genuine miss, which is exactly what its memory window is for.

use follow_hal::CameraFrame;
use follow_types::{ConfigError, DetectionEvent, FollowError};
use tracing::trace;

/// Anything that can look at a frame and report where the person is.
///
/// Confidence thresholding and class filtering happen inside the detector;
/// the event it returns is already final.  Calls must return within a bounded
/// time so the control loop keeps its cadence.
pub trait Detector: Send {
    /// # Errors
    ///
    /// Returns [`FollowError::DetectorFailed`] when inference could not run
    /// (e.g. the model session errored).  A frame without a person is not an
    /// error; it is [`DetectionEvent::miss`].
    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionEvent, FollowError>;
}

impl<D: Detector + ?Sized> Detector for Box<D> {
    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionEvent, FollowError> {
        (**self).detect(frame)
    }
}

/// Runs the inner detector on every `every_n`-th frame only.
///
/// Frames are counted from 1, and the detector runs when the count is a
/// multiple of `every_n`, so with `every_n = 3` frames 3, 6, 9, … are
/// inspected.
pub struct SkippingDetector<D> {
    inner: D,
    every_n: u64,
    frame_count: u64,
}

impl<D: Detector> SkippingDetector<D> {
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroDetectInterval`] when `every_n` is zero.
    pub fn new(inner: D, every_n: u32) -> Result<Self, ConfigError> {
        if every_n == 0 {
            return Err(ConfigError::ZeroDetectInterval);
        }
        Ok(Self {
            inner,
            every_n: u64::from(every_n),
            frame_count: 0,
        })
    }

    /// Number of frames seen so far, detected or skipped.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn inner(&self) -> &D {
        &self.inner
    }
}

impl<D: Detector> Detector for SkippingDetector<D> {
    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionEvent, FollowError> {
        self.frame_count += 1;
        if self.frame_count % self.every_n == 0 {
            self.inner.detect(frame)
        } else {
            trace!(frame = self.frame_count, "detector skipped");
            Ok(DetectionEvent::miss())
        }
    }
}
