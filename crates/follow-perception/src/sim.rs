//! Scripted detector for simulation and tests.
//!
//! [`ScriptedDetector`] ignores pixel content and replays a fixed list of
//! person boxes (or absences), one per call, wrapping around at the end.
//! Boxes are classified with the same [`ZoneClassifier`] a real pipeline
//! would use, against the width of the frame it is handed.

use follow_hal::CameraFrame;
use follow_types::{DetectionEvent, FollowError, Rect};

use crate::detector::Detector;
use crate::zones::ZoneClassifier;

/// Confidence reported for every scripted sighting.
const SCRIPTED_CONFIDENCE: f32 = 0.9;

/// Replays a fixed sequence of sightings.
pub struct ScriptedDetector {
    script: Vec<Option<Rect>>,
    cursor: usize,
    classifier: ZoneClassifier,
}

impl ScriptedDetector {
    pub fn new(script: Vec<Option<Rect>>, classifier: ZoneClassifier) -> Self {
        Self {
            script,
            cursor: 0,
            classifier,
        }
    }

    /// A person who stands on the left, walks through the centre to the
    /// right, then leaves the frame for a while.  Each phase lasts `dwell`
    /// calls.
    pub fn walk_across(
        frame_width: u32,
        frame_height: u32,
        dwell: usize,
        classifier: ZoneClassifier,
    ) -> Self {
        let w = frame_width as i32;
        let h = frame_height as i32;
        let person_width = (w / 8).max(1);
        let at = |center_x: i32| {
            Some(Rect::new(
                center_x - person_width / 2,
                h / 6,
                center_x + person_width / 2,
                h - h / 12,
            ))
        };

        let mut script = Vec::with_capacity(dwell * 4);
        for phase in [at(w / 6), at(w / 2), at(w - w / 6), None] {
            script.extend(std::iter::repeat_n(phase, dwell));
        }
        Self::new(script, classifier)
    }

    /// Number of entries in one pass of the script.
    pub fn len(&self) -> usize {
        self.script.len()
    }

    pub fn is_empty(&self) -> bool {
        self.script.is_empty()
    }
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionEvent, FollowError> {
        let Some(entry) = self.script.get(self.cursor).copied() else {
            return Ok(DetectionEvent::miss());
        };
        self.cursor = (self.cursor + 1) % self.script.len();

        Ok(match entry {
            Some(bbox) => {
                let zone = self.classifier.classify(&bbox, frame.width);
                DetectionEvent::found(bbox, zone, SCRIPTED_CONFIDENCE)
            }
            None => DetectionEvent::miss(),
        })
    }
}
