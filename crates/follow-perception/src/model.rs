//! A [`Detector`] built from an SSD network and [`SsdPostprocessor`].
//!
//! The network sits behind [`SsdModel`], so the frame handling around it can
//! be exercised without a runtime.  The ONNX Runtime implementation lives in
//! `onnx` behind the `onnx` cargo feature.

use follow_hal::CameraFrame;
use follow_types::{DetectionEvent, FollowError};
use tracing::trace;

use crate::detector::Detector;
use crate::ssd::SsdPostprocessor;

/// Where the person SSD model is looked for when no path is configured.
pub const DEFAULT_MODEL_PATH: &str = "models/person_ssd.onnx";

/// Values per SSD output row: `[image_id, class_id, conf, x1, y1, x2, y2]`.
pub const SSD_ROW_LEN: usize = 7;

/// An SSD network taking a `[1, 3, H, W]` RGB tensor in `[0, 1]`.
pub trait SsdModel: Send {
    /// Network input as `(width, height)`.
    fn input_size(&self) -> (u32, u32);

    /// Run the network on a CHW tensor of `3 * width * height` values and
    /// return its flattened detection output.
    fn infer(&mut self, input: Vec<f32>) -> Result<Vec<f32>, FollowError>;
}

impl<M: SsdModel + ?Sized> SsdModel for Box<M> {
    fn input_size(&self) -> (u32, u32) {
        (**self).input_size()
    }

    fn infer(&mut self, input: Vec<f32>) -> Result<Vec<f32>, FollowError> {
        (**self).infer(input)
    }
}

/// Resize `frame` to `width × height` (nearest neighbour), reorder BGR to
/// RGB and scale to `[0, 1]`, laid out channel-major.
///
/// Greyscale frames are replicated into all three channels.
pub fn preprocess(frame: &CameraFrame, width: u32, height: u32) -> Result<Vec<f32>, FollowError> {
    let channels = usize::from(frame.channels);
    if channels != 1 && channels != 3 {
        return Err(FollowError::DetectorFailed(format!(
            "unsupported frame with {channels} channel(s)"
        )));
    }
    let (fw, fh) = (frame.width as usize, frame.height as usize);
    if fw == 0 || fh == 0 || width == 0 || height == 0 {
        return Err(FollowError::DetectorFailed(format!(
            "cannot resize {fw}x{fh} frame to {width}x{height}"
        )));
    }
    if frame.data.len() < fw * fh * channels {
        return Err(FollowError::DetectorFailed(format!(
            "frame buffer holds {} bytes, {fw}x{fh}x{channels} expected",
            frame.data.len()
        )));
    }

    let (w, h) = (width as usize, height as usize);
    let plane = w * h;
    let mut chw = vec![0.0f32; 3 * plane];
    for y in 0..h {
        let sy = y * fh / h;
        for x in 0..w {
            let sx = x * fw / w;
            let px = (sy * fw + sx) * channels;
            // Output planes are R, G, B; input pixels are B, G, R.
            for c in 0..3 {
                let src = if channels == 1 { px } else { px + 2 - c };
                chw[c * plane + y * w + x] = f32::from(frame.data[src]) / 255.0;
            }
        }
    }
    Ok(chw)
}

/// Runs an [`SsdModel`] on each frame and keeps the best person.
pub struct SsdDetector<M> {
    model: M,
    post: SsdPostprocessor,
}

impl<M: SsdModel> SsdDetector<M> {
    pub fn new(model: M, post: SsdPostprocessor) -> Self {
        Self { model, post }
    }

    pub fn postprocessor(&self) -> &SsdPostprocessor {
        &self.post
    }
}

impl<M: SsdModel> Detector for SsdDetector<M> {
    fn detect(&mut self, frame: &CameraFrame) -> Result<DetectionEvent, FollowError> {
        let (w, h) = self.model.input_size();
        let input = preprocess(frame, w, h)?;
        let raw = self.model.infer(input)?;
        if raw.len() % SSD_ROW_LEN != 0 {
            return Err(FollowError::DetectorFailed(format!(
                "SSD output of {} values is not a multiple of {SSD_ROW_LEN}",
                raw.len()
            )));
        }
        let rows: Vec<[f32; SSD_ROW_LEN]> = raw
            .chunks_exact(SSD_ROW_LEN)
            .filter_map(|c| c.try_into().ok())
            .collect();
        trace!(rows = rows.len(), "ssd inference done");
        Ok(self.post.event(&rows, frame.width, frame.height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use follow_types::{Rect, Zone};

    /// Returns canned output and remembers the last input it was given.
    struct CannedModel {
        output: Vec<f32>,
        last_input: Vec<f32>,
    }

    impl CannedModel {
        fn new(output: Vec<f32>) -> Self {
            Self {
                output,
                last_input: Vec::new(),
            }
        }
    }

    impl SsdModel for CannedModel {
        fn input_size(&self) -> (u32, u32) {
            (4, 2)
        }

        fn infer(&mut self, input: Vec<f32>) -> Result<Vec<f32>, FollowError> {
            self.last_input = input;
            Ok(self.output.clone())
        }
    }

    fn bgr_frame(width: u32, height: u32, bgr: [u8; 3]) -> CameraFrame {
        CameraFrame {
            width,
            height,
            channels: 3,
            data: bgr.repeat((width * height) as usize),
        }
    }

    #[test]
    fn preprocess_swaps_to_rgb_planes() {
        let frame = bgr_frame(2, 2, [255, 0, 51]);
        let chw = preprocess(&frame, 2, 2).unwrap();
        assert_eq!(chw.len(), 12);
        assert!(chw[..4].iter().all(|&v| (v - 0.2).abs() < 1e-6)); // R
        assert!(chw[4..8].iter().all(|&v| v == 0.0)); // G
        assert!(chw[8..].iter().all(|&v| v == 1.0)); // B
    }

    #[test]
    fn preprocess_resizes_nearest_neighbour() {
        // 2×1 frame, left pixel black, right pixel white; upscale to 4×1.
        let frame = CameraFrame {
            width: 2,
            height: 1,
            channels: 1,
            data: vec![0, 255],
        };
        let chw = preprocess(&frame, 4, 1).unwrap();
        assert_eq!(&chw[..4], &[0.0, 0.0, 1.0, 1.0]);
        assert_eq!(&chw[4..8], &chw[..4]);
    }

    #[test]
    fn preprocess_rejects_short_buffer() {
        let mut frame = bgr_frame(4, 4, [0, 0, 0]);
        frame.data.truncate(10);
        assert!(matches!(
            preprocess(&frame, 2, 2),
            Err(FollowError::DetectorFailed(_))
        ));
    }

    #[test]
    fn preprocess_rejects_empty_frame() {
        assert!(preprocess(&CameraFrame::blank(0, 0, 3), 300, 300).is_err());
        assert!(preprocess(&CameraFrame::blank(4, 4, 4), 2, 2).is_err());
    }

    #[test]
    fn detector_feeds_model_output_through_postprocessor() {
        let output = vec![
            0.0, 7.0, 0.99, 0.0, 0.0, 0.5, 0.5, // car
            0.0, 15.0, 0.9, 0.0, 0.25, 0.25, 0.75, // person, left
        ];
        let mut det = SsdDetector::new(CannedModel::new(output), SsdPostprocessor::default());
        let ev = det.detect(&bgr_frame(640, 480, [10, 20, 30])).unwrap();
        assert!(ev.found);
        assert_eq!(ev.zone, Some(Zone::Left));
        assert_eq!(ev.bbox, Some(Rect::new(0, 120, 160, 360)));
        assert_eq!(det.model.last_input.len(), 3 * 4 * 2);
    }

    #[test]
    fn detector_honours_threshold_and_class() {
        let post = SsdPostprocessor {
            confidence_threshold: 0.95,
            ..SsdPostprocessor::default()
        };
        let output = vec![0.0, 15.0, 0.9, 0.0, 0.0, 0.5, 0.5];
        let mut det = SsdDetector::new(CannedModel::new(output), post);
        let ev = det.detect(&bgr_frame(8, 8, [0, 0, 0])).unwrap();
        assert_eq!(ev, DetectionEvent::miss());
    }

    #[test]
    fn ragged_output_is_a_detector_error() {
        let mut det = SsdDetector::new(
            CannedModel::new(vec![0.0; 10]),
            SsdPostprocessor::default(),
        );
        assert!(matches!(
            det.detect(&bgr_frame(8, 8, [0, 0, 0])),
            Err(FollowError::DetectorFailed(_))
        ));
    }
}
