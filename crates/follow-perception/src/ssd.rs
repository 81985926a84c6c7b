//! SSD (MobileNet-SSD style) post-processing.
//!
//! The network emits a `[1, 1, N, 7]` tensor whose rows read
//! `[image_id, class_id, confidence, x1, y1, x2, y2]` with coordinates
//! normalised to `[0, 1]`.  We keep the single most confident row of the
//! person class at or above the threshold, scale it back to frame pixels and
//! classify it into a zone.

use follow_types::{DetectionEvent, Rect};
use tracing::debug;

use crate::zones::ZoneClassifier;

/// Pascal VOC index of "person", as used by MobileNet-SSD.
pub const VOC_PERSON_CLASS: u32 = 15;

/// Pick the most confident person detection from raw SSD rows.
///
/// Rows below `threshold` or of another class are ignored.  Returns the box
/// in pixel coordinates (fractions truncated, like an integer cast) and its
/// confidence, or `None` if no row qualifies.
pub fn select_person(
    rows: &[[f32; 7]],
    frame_width: u32,
    frame_height: u32,
    threshold: f32,
    person_class: u32,
) -> Option<(Rect, f32)> {
    let w = frame_width as f32;
    let h = frame_height as f32;

    let mut best: Option<(Rect, f32)> = None;
    for row in rows {
        let [_, class_id, conf, x1, y1, x2, y2] = *row;
        if !conf.is_finite() || class_id as i64 != i64::from(person_class) || conf < threshold {
            continue;
        }
        if best.is_some_and(|(_, best_conf)| conf <= best_conf) {
            continue;
        }
        let bbox = Rect::new(
            (x1 * w) as i32,
            (y1 * h) as i32,
            (x2 * w) as i32,
            (y2 * h) as i32,
        );
        best = Some((bbox, conf));
    }
    best
}

/// Turns raw SSD output into a [`DetectionEvent`].
#[derive(Debug, Clone)]
pub struct SsdPostprocessor {
    pub confidence_threshold: f32,
    pub person_class: u32,
    pub classifier: ZoneClassifier,
}

impl Default for SsdPostprocessor {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.7,
            person_class: VOC_PERSON_CLASS,
            classifier: ZoneClassifier::default(),
        }
    }
}

impl SsdPostprocessor {
    pub fn event(&self, rows: &[[f32; 7]], frame_width: u32, frame_height: u32) -> DetectionEvent {
        match select_person(
            rows,
            frame_width,
            frame_height,
            self.confidence_threshold,
            self.person_class,
        ) {
            Some((bbox, conf)) => {
                let zone = self.classifier.classify(&bbox, frame_width);
                debug!(?bbox, conf, %zone, "person detected");
                DetectionEvent::found(bbox, zone, conf)
            }
            None => DetectionEvent::miss(),
        }
    }
}
