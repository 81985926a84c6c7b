//! `follow-runtime` – the decision engine and the loop that drives it.
//!
//! # Modules
//!
//! - [`brain`] – [`Brain`][brain::Brain]: the stateful temporal filter that
//!   turns a stream of noisy [`DetectionEvent`][follow_types::DetectionEvent]s
//!   into stable [`MotionCommand`][follow_types::MotionCommand]s (follow,
//!   memory, search).
//! - [`zone_history`] – [`ZoneHistory`][zone_history::ZoneHistory]: the
//!   bounded window of raw zone observations and its majority vote.
//! - [`clock`] – the injected [`Clock`][clock::Clock]: a monotonic clock for
//!   real runs and a [`ManualClock`][clock::ManualClock] for deterministic
//!   tests.
//! - [`mailbox`] – [`Mailbox`][mailbox::Mailbox]: the single "latest frame"
//!   slot shared between the capture thread and the control loop.
//! - [`capture`] – [`CaptureWorker`][capture::CaptureWorker]: the camera
//!   thread that keeps the mailbox filled.
//! - [`control_loop`] – [`ControlLoop`][control_loop::ControlLoop]: frame →
//!   detector → brain → motors, with edge-triggered command application and
//!   a guaranteed final stop.
//! - [`telemetry`] – [`init_tracing`][telemetry::init_tracing]: initialises
//!   the global `tracing` subscriber with an optional OTLP span exporter.

pub mod brain;
pub mod capture;
pub mod clock;
pub mod control_loop;
pub mod mailbox;
pub mod telemetry;
pub mod zone_history;

pub use brain::{Brain, Mode};
pub use capture::{CaptureOptions, CaptureWorker};
pub use clock::{Clock, ManualClock, MonotonicClock, Timestamp};
pub use control_loop::{ControlLoop, TickReport};
pub use mailbox::{FrameMailbox, Mailbox};
pub use telemetry::{TracerProviderGuard, init_tracing};
pub use zone_history::ZoneHistory;
