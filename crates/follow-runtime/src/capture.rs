//! [`CaptureWorker`] – background thread feeding the frame mailbox.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use follow_hal::Camera;
use tracing::{debug, info, warn};

use crate::mailbox::FrameMailbox;

/// How the capture thread behaves.
#[derive(Debug, Clone, Copy)]
pub struct CaptureOptions {
    /// Rotate every frame by 180° before publishing it.
    pub rotate_180: bool,
    /// Pause between successful captures.  Real cameras block in `capture`
    /// and can use zero; simulated ones need a pace.
    pub frame_interval: Duration,
    /// Pause after a failed capture before trying again.
    pub retry_delay: Duration,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            rotate_180: false,
            frame_interval: Duration::ZERO,
            retry_delay: Duration::from_millis(10),
        }
    }
}

/// Owns the camera thread.  Stopping (or dropping) the worker joins it.
pub struct CaptureWorker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl CaptureWorker {
    /// Start capturing from `camera` into `mailbox`.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the thread cannot be spawned.
    pub fn spawn(
        mut camera: Box<dyn Camera>,
        mailbox: FrameMailbox,
        options: CaptureOptions,
    ) -> std::io::Result<Self> {
        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let name = format!("capture-{}", camera.id());

        let handle = thread::Builder::new().name(name).spawn(move || {
            info!(camera = camera.id(), "capture thread started");
            while flag.load(Ordering::SeqCst) {
                match camera.capture() {
                    Ok(mut frame) => {
                        if options.rotate_180 {
                            frame.rotate_180();
                        }
                        mailbox.put(frame);
                        if !options.frame_interval.is_zero() {
                            thread::sleep(options.frame_interval);
                        }
                    }
                    Err(e) => {
                        warn!(camera = camera.id(), error = %e, "frame capture failed");
                        thread::sleep(options.retry_delay);
                    }
                }
            }
            debug!(
                camera = camera.id(),
                dropped = mailbox.dropped(),
                "capture thread exiting"
            );
        })?;

        Ok(Self {
            running,
            handle: Some(handle),
        })
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Ask the thread to stop and wait for it.  Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            warn!("capture thread panicked");
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
