//! Zone Classifier.
//!
//! The frame width `W` is split into three contiguous bands using the
//! configured [`ZoneBands`] ratios:
//!
//! ```text
//! | LEFT              | CENTER        | RIGHT             |
//! 0            left·W      (left+center)·W                W
//! ```
//!
//! A box is assigned to the band its horizontal extent overlaps most.  When
//! even the best overlap covers less than 10 % of the box width (boxes that
//! are mostly out of frame, or have no width at all) the classifier answers
//! CENTER, so that degenerate geometry never steers the robot to one side.
//! Exact ties go to the first band in LEFT, CENTER, RIGHT order.
//!
//! # Example
//!
//! ```rust
//! use follow_perception::zones::ZoneClassifier;
//! use follow_types::{Rect, Zone};
//!
//! let classifier = ZoneClassifier::default();
//! assert_eq!(classifier.classify(&Rect::new(10, 0, 100, 200), 640), Zone::Left);
//! assert_eq!(classifier.classify(&Rect::new(280, 0, 360, 200), 640), Zone::Center);
//! assert_eq!(classifier.classify(&Rect::new(500, 0, 600, 200), 640), Zone::Right);
//! ```

use follow_types::{Rect, Zone, ZoneBands};

/// Below this fraction of the box width the best overlap counts as noise.
const DEGENERATE_OVERLAP_FRACTION: f64 = 0.1;

/// Band edges are snapped to this many steps per pixel, so decimal ratios
/// such as 0.35 land on whole pixels instead of a rounding error away.
const EDGE_STEPS_PER_PIXEL: f64 = 1024.0;

fn snap(x: f64) -> f64 {
    (x * EDGE_STEPS_PER_PIXEL).round() / EDGE_STEPS_PER_PIXEL
}

/// Length of the intersection of two 1-D intervals, or zero if disjoint.
pub fn overlap(a: (f64, f64), b: (f64, f64)) -> f64 {
    (a.1.min(b.1) - a.0.max(b.0)).max(0.0)
}

/// Stateless mapping from a bounding box to a [`Zone`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZoneClassifier {
    bands: ZoneBands,
}

impl ZoneClassifier {
    /// Build a classifier over `bands`.  The ratios are expected to have
    /// passed [`ZoneBands::validate`].
    pub fn new(bands: ZoneBands) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &ZoneBands {
        &self.bands
    }

    /// Band boundaries `[start, end)` for LEFT, CENTER and RIGHT, in pixels.
    pub fn band_edges(&self, frame_width: u32) -> [(f64, f64); 3] {
        let w = f64::from(frame_width);
        let left_end = snap(self.bands.left_ratio * w);
        let center_end = snap((self.bands.left_ratio + self.bands.center_ratio) * w);
        [(0.0, left_end), (left_end, center_end), (center_end, w)]
    }

    /// Classify `bbox` within a frame `frame_width` pixels wide.
    ///
    /// Total for any box: inverted boxes are treated as zero-width and
    /// therefore fall back to CENTER.
    pub fn classify(&self, bbox: &Rect, frame_width: u32) -> Zone {
        let box_width = f64::from(bbox.width());
        if box_width <= 0.0 || frame_width == 0 {
            return Zone::Center;
        }
        let extent = (f64::from(bbox.x1), f64::from(bbox.x2));

        let mut best = Zone::Center;
        let mut best_overlap = f64::NEG_INFINITY;
        for (zone, band) in Zone::ALL.into_iter().zip(self.band_edges(frame_width)) {
            let o = overlap(extent, band);
            if o > best_overlap {
                best = zone;
                best_overlap = o;
            }
        }

        if best_overlap < DEGENERATE_OVERLAP_FRACTION * box_width {
            return Zone::Center;
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: u32 = 640;

    fn quarters() -> ZoneClassifier {
        // [0,100) [100,300) [300,400) for W = 400, all exactly representable.
        ZoneClassifier::new(ZoneBands {
            left_ratio: 0.25,
            center_ratio: 0.5,
            right_ratio: 0.25,
        })
    }

    #[test]
    fn overlap_of_disjoint_intervals_is_zero() {
        assert_eq!(overlap((0.0, 10.0), (20.0, 30.0)), 0.0);
        assert_eq!(overlap((0.0, 10.0), (5.0, 30.0)), 5.0);
        assert_eq!(overlap((5.0, 6.0), (0.0, 30.0)), 1.0);
    }

    #[test]
    fn box_inside_each_band_gets_that_band() {
        let c = ZoneClassifier::default();
        assert_eq!(c.classify(&Rect::new(10, 0, 200, 300), W), Zone::Left);
        assert_eq!(c.classify(&Rect::new(250, 0, 400, 300), W), Zone::Center);
        assert_eq!(c.classify(&Rect::new(450, 0, 630, 300), W), Zone::Right);
    }

    #[test]
    fn straddling_box_goes_to_larger_overlap() {
        let c = ZoneClassifier::default();
        // Left band ends at 224: 124 px left vs 76 px center.
        assert_eq!(c.classify(&Rect::new(100, 0, 300, 300), W), Zone::Left);
        // Right band starts at 416: 16 px center vs 164 px right.
        assert_eq!(c.classify(&Rect::new(400, 0, 580, 300), W), Zone::Right);
    }

    #[test]
    fn ties_break_in_left_center_right_order() {
        let c = quarters();
        assert_eq!(c.classify(&Rect::new(50, 0, 150, 10), 400), Zone::Left);
        assert_eq!(c.classify(&Rect::new(250, 0, 350, 10), 400), Zone::Center);
    }

    #[test]
    fn zero_width_box_falls_back_to_center() {
        let c = ZoneClassifier::default();
        assert_eq!(c.classify(&Rect::new(20, 0, 20, 100), W), Zone::Center);
        assert_eq!(c.classify(&Rect::new(600, 0, 600, 100), W), Zone::Center);
    }

    #[test]
    fn inverted_box_falls_back_to_center() {
        let c = ZoneClassifier::default();
        assert_eq!(c.classify(&Rect::new(100, 0, 20, 100), W), Zone::Center);
    }

    #[test]
    fn mostly_out_of_frame_box_falls_back_to_center() {
        let c = ZoneClassifier::default();
        // Width 65, only 5 px inside the right band: 5 < 6.5.
        assert_eq!(c.classify(&Rect::new(635, 0, 700, 100), W), Zone::Center);
        // Entirely outside on either side.
        assert_eq!(c.classify(&Rect::new(700, 0, 800, 100), W), Zone::Center);
        assert_eq!(c.classify(&Rect::new(-100, 0, -50, 100), W), Zone::Center);
    }

    #[test]
    fn partly_out_of_frame_box_above_threshold_is_classified() {
        let c = ZoneClassifier::default();
        // Width 70, 10 px inside the right band: 10 >= 7.
        assert_eq!(c.classify(&Rect::new(630, 0, 700, 100), W), Zone::Right);
    }

    #[test]
    fn band_edges_follow_ratios() {
        let edges = quarters().band_edges(400);
        assert_eq!(edges, [(0.0, 100.0), (100.0, 300.0), (300.0, 400.0)]);
    }

    #[test]
    fn default_band_edges_are_whole_pixels() {
        let edges = ZoneClassifier::default().band_edges(W);
        assert_eq!(edges, [(0.0, 224.0), (224.0, 416.0), (416.0, 640.0)]);
    }

    #[test]
    fn box_starting_on_right_edge_is_right() {
        let c = ZoneClassifier::default();
        // [416, 436) lies wholly in the right band.
        assert_eq!(c.classify(&Rect::new(416, 0, 436, 100), W), Zone::Right);
        assert_eq!(c.classify(&Rect::new(396, 0, 416, 100), W), Zone::Center);
    }

    #[test]
    fn box_spanning_whole_i32_range_falls_back_to_center() {
        let c = ZoneClassifier::default();
        // Best overlap is one band, far below 10 % of the box width.
        let zone = c.classify(&Rect::new(i32::MIN, 0, i32::MAX, 10), W);
        assert_eq!(zone, Zone::Center);
    }

    #[test]
    fn box_wider_than_i32_but_mostly_in_frame_is_center() {
        let c = ZoneClassifier::default();
        assert_eq!(c.classify(&Rect::new(i32::MIN, 0, 300, 10), W), Zone::Center);
        assert_eq!(c.classify(&Rect::new(-10, 0, i32::MAX, 10), W), Zone::Center);
    }

    #[test]
    fn zero_frame_width_does_not_panic() {
        let c = ZoneClassifier::default();
        assert_eq!(c.classify(&Rect::new(0, 0, 10, 10), 0), Zone::Center);
    }
}
