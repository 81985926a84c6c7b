//! Generic `Camera` trait and the frame type it produces.

use follow_types::FollowError;

/// A raw, packed image frame returned by a camera driver.
#[derive(Debug, Clone)]
pub struct CameraFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Bytes per pixel (3 for BGR24/RGB24, 1 for greyscale).
    pub channels: u8,
    /// Row-major pixel data, `width * height * channels` bytes.
    pub data: Vec<u8>,
}

impl CameraFrame {
    /// An all-black frame of the given geometry.
    pub fn blank(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
            data: vec![0u8; width as usize * height as usize * channels as usize],
        }
    }

    /// Rotate the frame by 180° in place, for cameras mounted upside down.
    ///
    /// A half-turn of a row-major image is a reversal of its pixel order, so
    /// this reverses pixels while keeping each pixel's channel bytes in order.
    pub fn rotate_180(&mut self) {
        let channels = self.channels.max(1) as usize;
        let pixels = self.data.len() / channels;
        for i in 0..pixels / 2 {
            let j = pixels - 1 - i;
            for c in 0..channels {
                self.data.swap(i * channels + c, j * channels + c);
            }
        }
    }
}

/// A camera or other image-capture device.
pub trait Camera: Send {
    /// Stable identifier for this camera, e.g. `"front_rgb"`.
    fn id(&self) -> &str;

    /// Capture and return the next available frame.
    ///
    /// # Errors
    ///
    /// Returns [`FollowError::HardwareFault`] if the frame cannot be captured
    /// (e.g. the device is disconnected or the buffer is unavailable).
    fn capture(&mut self) -> Result<CameraFrame, FollowError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_frame_has_expected_size() {
        let frame = CameraFrame::blank(4, 2, 3);
        assert_eq!(frame.data.len(), 24);
        assert!(frame.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn rotate_180_reverses_pixels_not_channels() {
        // 2×1 RGB frame: pixel A = (1,2,3), pixel B = (4,5,6).
        let mut frame = CameraFrame {
            width: 2,
            height: 1,
            channels: 3,
            data: vec![1, 2, 3, 4, 5, 6],
        };
        frame.rotate_180();
        assert_eq!(frame.data, vec![4, 5, 6, 1, 2, 3]);
    }

    #[test]
    fn rotate_180_twice_is_identity() {
        let original: Vec<u8> = (0..9).collect();
        let mut frame = CameraFrame {
            width: 3,
            height: 3,
            channels: 1,
            data: original.clone(),
        };
        frame.rotate_180();
        assert_eq!(frame.data, vec![8, 7, 6, 5, 4, 3, 2, 1, 0]);
        frame.rotate_180();
        assert_eq!(frame.data, original);
    }
}
