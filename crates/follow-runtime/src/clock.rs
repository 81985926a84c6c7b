//! Injected time sources.
//!
//! The brain never reads the system clock itself; it is handed a
//! [`Timestamp`] on every update.  Real runs use [`MonotonicClock`], tests use
//! [`ManualClock`] and move time by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic time elapsed since the clock's origin.
pub type Timestamp = Duration;

/// A monotonic time source.
pub trait Clock: Send {
    fn now(&self) -> Timestamp;
}

/// Wall-independent clock backed by [`Instant`], starting at zero when
/// constructed.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        self.origin.elapsed()
    }
}

/// Hand-driven clock.  Clones share the same time, so a test can keep one
/// handle while the control loop owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, t: Timestamp) {
        self.nanos.store(to_nanos(t), Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.nanos.fetch_add(to_nanos(by), Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }
}

fn to_nanos(d: Duration) -> u64 {
    u64::try_from(d.as_nanos()).unwrap_or(u64::MAX)
}
