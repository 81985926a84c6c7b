//! [`Brain`] – the perception-to-motion decision engine.
//!
//! A Mealy-style machine: every [`Brain::update`] looks at the current
//! [`DetectionEvent`] plus how much time has passed, picks one of three
//! behaviours and emits a [`MotionCommand`].
//!
//! | behaviour | when | command |
//! |---|---|---|
//! | **Follow** | the person is visible | steer towards the *stable* zone |
//! | **Memory** | lost for less than `memory_seconds` | repeat the last direction (CENTER at reduced speed) |
//! | **Search** | never seen, or lost for longer | spin in place |
//!
//! # Stable zone
//!
//! The raw zone is appended to a [`ZoneHistory`] and the majority vote is
//! taken.  A vote that differs from the current stable zone is only accepted
//! when at least `flicker_guard_seconds` have passed since the last accepted
//! change; otherwise the stable zone is kept.
//!
//! # Stale votes after a search
//!
//! Entering Search keeps both the history and the last seen zone by default,
//! so the first decisions after reacquiring the person are still biased by
//! votes cast before they were lost.  Set
//! [`BrainConfig::reset_history_on_search`] to start from an empty history
//! instead.
//!
//! # Caller contract
//!
//! `now` must be non-decreasing across calls.  Repeating a call with the
//! same `(event, now)` is allowed but not idempotent: a found event is
//! appended to the history twice.  A clock that goes backwards is treated as
//! zero elapsed time rather than a panic.
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use follow_runtime::brain::Brain;
//! use follow_types::{BrainConfig, CommandLabel, DetectionEvent, Rect, Zone};
//!
//! let mut brain = Brain::new(BrainConfig::default());
//!
//! let seen = DetectionEvent::found(Rect::new(10, 0, 100, 200), Zone::Left, 0.9);
//! let cmd = brain.update(&seen, Duration::ZERO);
//! assert_eq!(cmd.label, CommandLabel::FollowLeft);
//! assert_eq!((cmd.left_speed, cmd.right_speed), (3, 23));
//!
//! let cmd = brain.update(&DetectionEvent::miss(), Duration::from_millis(300));
//! assert_eq!(cmd.label, CommandLabel::MemoryLeft);
//!
//! let cmd = brain.update(&DetectionEvent::miss(), Duration::from_secs(2));
//! assert_eq!(cmd.label, CommandLabel::SearchSpin);
//! ```

use std::time::Duration;

use follow_types::{BrainConfig, CommandLabel, DetectionEvent, MotionCommand, Zone};
use tracing::{debug, info, warn};

use crate::clock::Timestamp;
use crate::zone_history::ZoneHistory;

/// Behaviour selected by the most recent update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Follow,
    Memory,
    Search,
}

/// The decision engine.  Owned by exactly one control loop; not `Sync`-shared.
#[derive(Debug)]
pub struct Brain {
    config: BrainConfig,
    memory_window: Duration,
    flicker_guard: Duration,
    history: ZoneHistory,
    last_seen_zone: Option<Zone>,
    last_seen_time: Timestamp,
    last_zone_switch_time: Timestamp,
    mode: Option<Mode>,
}

impl Brain {
    /// Build a brain with empty history and zero timestamps.  `config` should
    /// already have passed [`BrainConfig::validate`].
    pub fn new(config: BrainConfig) -> Self {
        Self {
            memory_window: config.memory_window(),
            flicker_guard: config.flicker_guard(),
            history: ZoneHistory::new(config.zone_history_capacity),
            last_seen_zone: None,
            last_seen_time: Duration::ZERO,
            last_zone_switch_time: Duration::ZERO,
            mode: None,
            config,
        }
    }

    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    /// Behaviour chosen by the last update, `None` before the first one.
    pub fn mode(&self) -> Option<Mode> {
        self.mode
    }

    /// The current stable zone.
    pub fn last_seen_zone(&self) -> Option<Zone> {
        self.last_seen_zone
    }

    pub fn history(&self) -> &ZoneHistory {
        &self.history
    }

    /// Advance the machine by one event observed at `now`.
    ///
    /// Never fails: a found event without a zone yields the zero-speed
    /// `zone_error` command and leaves the state untouched.
    pub fn update(&mut self, event: &DetectionEvent, now: Timestamp) -> MotionCommand {
        if event.found {
            let Some(raw) = event.zone else {
                warn!("found event without a zone; commanding zero speed");
                return MotionCommand::new(0, 0, CommandLabel::ZoneError);
            };
            self.enter(Mode::Follow);
            return self.follow(raw, now);
        }

        if event.zone.is_some() || event.bbox.is_some() {
            debug!("miss event carries geometry; ignoring it");
        }

        match self.last_seen_zone {
            Some(zone) if now.saturating_sub(self.last_seen_time) < self.memory_window => {
                self.enter(Mode::Memory);
                self.memory(zone)
            }
            _ => {
                if self.enter(Mode::Search) && self.config.reset_history_on_search {
                    self.history.clear();
                }
                let spin = self.config.search_spin_speed;
                MotionCommand::new(spin, spin.saturating_neg(), CommandLabel::SearchSpin)
            }
        }
    }

    fn follow(&mut self, raw: Zone, now: Timestamp) -> MotionCommand {
        self.history.push(raw);
        let voted = self.history.majority().unwrap_or(raw);

        let stable = match self.last_seen_zone {
            Some(current)
                if voted != current
                    && now.saturating_sub(self.last_zone_switch_time) < self.flicker_guard =>
            {
                debug!(%current, %voted, "zone switch rejected by flicker guard");
                current
            }
            current => {
                if current != Some(voted) {
                    debug!(from = ?current, to = %voted, "stable zone switched");
                    self.last_zone_switch_time = now;
                }
                voted
            }
        };

        self.last_seen_time = now;
        self.last_seen_zone = Some(stable);

        let base = self.config.base_speed;
        match stable {
            Zone::Center => MotionCommand::new(base, base, CommandLabel::FollowCenter),
            Zone::Left => self.steer(Zone::Left, CommandLabel::FollowLeft),
            Zone::Right => self.steer(Zone::Right, CommandLabel::FollowRight),
        }
    }

    fn memory(&self, zone: Zone) -> MotionCommand {
        match zone {
            Zone::Left => self.steer(Zone::Left, CommandLabel::MemoryLeft),
            Zone::Right => self.steer(Zone::Right, CommandLabel::MemoryRight),
            Zone::Center => {
                let base = self.config.base_speed;
                let coast = (base as f32 * self.config.memory_center_scale).round() as i32;
                MotionCommand::new(coast, coast, CommandLabel::MemoryCenter)
            }
        }
    }

    /// Turn towards `side`: slow the inner wheel, speed up the outer one.
    fn steer(&self, side: Zone, label: CommandLabel) -> MotionCommand {
        let inner = self.config.base_speed.saturating_sub(self.config.turn_delta);
        let outer = self.config.base_speed.saturating_add(self.config.turn_delta);
        match side {
            Zone::Right => MotionCommand::new(outer, inner, label),
            _ => MotionCommand::new(inner, outer, label),
        }
    }

    /// Record the behaviour of this update; returns `true` on a change.
    fn enter(&mut self, mode: Mode) -> bool {
        if self.mode == Some(mode) {
            return false;
        }
        info!(from = ?self.mode, to = ?mode, "behaviour changed");
        self.mode = Some(mode);
        true
    }
}
