//! [`ZoneHistory`] – rolling window of raw zone observations.
//!
//! Per-frame zones are noisy: a single mis-placed box would otherwise swing
//! the robot.  The history keeps the last *K* raw zones and reports the one
//! that occurs most often.
//!
//! # Tie-break
//!
//! When several zones share the highest count, the zone observed most
//! recently wins.  With `[LEFT, RIGHT]` the vote is RIGHT; with
//! `[LEFT, RIGHT, RIGHT, LEFT]` it is LEFT.
//!
//! # Example
//!
//! ```rust
//! use follow_runtime::zone_history::ZoneHistory;
//! use follow_types::Zone;
//!
//! let mut history = ZoneHistory::new(5);
//! history.push(Zone::Left);
//! history.push(Zone::Left);
//! history.push(Zone::Right);
//! assert_eq!(history.majority(), Some(Zone::Left));
//! ```

use std::collections::VecDeque;

use follow_types::Zone;

/// Bounded FIFO of raw zones with a majority vote.
#[derive(Debug, Clone)]
pub struct ZoneHistory {
    capacity: usize,
    zones: VecDeque<Zone>,
}

impl ZoneHistory {
    /// Create an empty history holding at most `capacity` zones (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            zones: VecDeque::with_capacity(capacity),
        }
    }

    /// Append `zone`, evicting the oldest entry when full.
    pub fn push(&mut self, zone: Zone) {
        self.zones.push_back(zone);
        while self.zones.len() > self.capacity {
            self.zones.pop_front();
        }
    }

    /// The most frequent zone, or `None` when empty.  See the module docs
    /// for the tie-break rule.
    pub fn majority(&self) -> Option<Zone> {
        Zone::ALL
            .into_iter()
            .filter_map(|zone| {
                let last_seen = self.zones.iter().rposition(|z| *z == zone)?;
                let count = self.zones.iter().filter(|z| **z == zone).count();
                Some((count, last_seen, zone))
            })
            .max_by_key(|&(count, last_seen, _)| (count, last_seen))
            .map(|(_, _, zone)| zone)
    }

    pub fn clear(&mut self) {
        self.zones.clear();
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Zones oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }
}
