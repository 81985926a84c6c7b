//! [`Mailbox`] – single-slot, last-write-wins hand-off between threads.
//!
//! The capture thread writes every frame it grabs; the control loop takes
//! whatever is newest when it is ready.  There is no queue: a frame that is
//! overwritten before being taken is simply dropped, so the loop always works
//! on the freshest image and never builds up latency.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use follow_hal::CameraFrame;

/// Mailbox carrying camera frames.
pub type FrameMailbox = Mailbox<CameraFrame>;

/// Mutex-guarded latest-value cell.  Clones share the same slot.
#[derive(Debug)]
pub struct Mailbox<T> {
    slot: Arc<Mutex<Option<T>>>,
    dropped: Arc<AtomicU64>,
}

impl<T> Clone for Mailbox<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Arc::clone(&self.slot),
            dropped: Arc::clone(&self.dropped),
        }
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self {
            slot: Arc::new(Mutex::new(None)),
            dropped: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // The slot holds plain data; a writer that panicked cannot leave it
        // half-updated, so recover from poisoning.
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Store `value`, replacing (and dropping) any value not yet taken.
    pub fn put(&self, value: T) {
        if self.lock().replace(value).is_some() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove and return the newest value, or `None` if nothing new arrived
    /// since the last take.  Never blocks on an empty slot.
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// `true` when a value is waiting.
    pub fn is_ready(&self) -> bool {
        self.lock().is_some()
    }

    /// Number of values overwritten before anyone took them.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn empty_mailbox_returns_none() {
        let mb: Mailbox<u32> = Mailbox::new();
        assert!(!mb.is_ready());
        assert_eq!(mb.take(), None);
    }

    #[test]
    fn last_write_wins() {
        let mb = Mailbox::new();
        mb.put(1);
        mb.put(2);
        mb.put(3);
        assert_eq!(mb.take(), Some(3));
        assert_eq!(mb.take(), None);
        assert_eq!(mb.dropped(), 2);
    }

    #[test]
    fn clones_share_the_slot() {
        let writer = Mailbox::new();
        let reader = writer.clone();
        writer.put("frame");
        assert!(reader.is_ready());
        assert_eq!(reader.take(), Some("frame"));
        assert!(!writer.is_ready());
    }

    #[test]
    fn cross_thread_hand_off() {
        let mb = Mailbox::new();
        let writer = mb.clone();
        let handle = thread::spawn(move || {
            for i in 0..100u32 {
                writer.put(i);
            }
        });
        handle.join().unwrap();
        assert_eq!(mb.take(), Some(99));
    }
}
