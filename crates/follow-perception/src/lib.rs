//! `follow-perception` – from pixels to a [`DetectionEvent`].
//!
//! The neural network itself lives behind the [`Detector`][detector::Detector]
//! trait.  This crate owns everything around it that has actual policy:
//! which raw detection counts as "the person", and where that person sits in
//! the frame.
//!
//! # Modules
//!
//! - [`zones`] – [`ZoneClassifier`][zones::ZoneClassifier]: maps a bounding
//!   box onto LEFT / CENTER / RIGHT by overlap with three horizontal bands.
//! - [`ssd`] – [`SsdPostprocessor`][ssd::SsdPostprocessor]: picks the most
//!   confident person out of an SSD output tensor and classifies it.
//! - [`detector`] – the [`Detector`][detector::Detector] seam and
//!   [`SkippingDetector`][detector::SkippingDetector], which only runs the
//!   network on every N-th frame.
//! - [`model`] – [`SsdDetector`][model::SsdDetector]: frame preprocessing
//!   around an [`SsdModel`][model::SsdModel], feeding its output through the
//!   post-processor.  With the `onnx` feature, `onnx::OnnxSsdModel` runs the
//!   network on ONNX Runtime.
//! - [`sim`] – [`ScriptedDetector`][sim::ScriptedDetector]: replays a fixed
//!   sequence of boxes for simulation and tests.
//!
//! [`DetectionEvent`]: follow_types::DetectionEvent

pub mod detector;
pub mod model;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod sim;
pub mod ssd;
pub mod zones;

pub use detector::{Detector, SkippingDetector};
pub use model::{SsdDetector, SsdModel, preprocess};
#[cfg(feature = "onnx")]
pub use onnx::OnnxSsdModel;
pub use sim::ScriptedDetector;
pub use ssd::{SsdPostprocessor, select_person};
pub use zones::{ZoneClassifier, overlap};
