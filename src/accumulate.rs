//! Progressive blending of successive frames.

use image::Rgb32FImage;
use log::warn;

/// Running average of rendered frames.
///
/// Each new frame is mixed in with weight `1 / max(1, count)`, where `count`
/// includes the new frame, so the result is the mean of all frames so far.
#[derive(Debug, Clone)]
pub struct FrameAccumulator {
    image: Rgb32FImage,
    frames: u32,
}

impl FrameAccumulator {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: Rgb32FImage::new(width, height),
            frames: 0,
        }
    }

    pub fn frame_count(&self) -> u32 {
        self.frames
    }

    /// Weight given to the next frame.
    pub fn next_weight(&self) -> f32 {
        1.0 / (self.frames + 1).max(1) as f32
    }

    /// Mix `frame` into the running average.
    ///
    /// Frames whose size does not match the accumulator are skipped.
    pub fn blend(&mut self, frame: &Rgb32FImage) {
        if frame.dimensions() != self.image.dimensions() {
            warn!(
                "Skipping {:?} frame in {:?} accumulator",
                frame.dimensions(),
                self.image.dimensions()
            );
            return;
        }
        let weight = self.next_weight();
        for (acc, new) in self.image.iter_mut().zip(frame.iter()) {
            *acc += (*new - *acc) * weight;
        }
        self.frames += 1;
    }

    pub fn image(&self) -> &Rgb32FImage {
        &self.image
    }

    pub fn into_image(self) -> Rgb32FImage {
        self.image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use image::Rgb;

    #[test]
    fn first_frame_replaces_then_averages() {
        let mut acc = FrameAccumulator::new(2, 2);
        assert_abs_diff_eq!(acc.next_weight(), 1.0);
        acc.blend(&Rgb32FImage::from_pixel(2, 2, Rgb([1.0, 0.0, 0.5])));
        assert_eq!(acc.image().get_pixel(1, 1).0, [1.0, 0.0, 0.5]);

        acc.blend(&Rgb32FImage::from_pixel(2, 2, Rgb([0.0, 1.0, 0.5])));
        acc.blend(&Rgb32FImage::from_pixel(2, 2, Rgb([0.5, 0.5, 0.5])));
        let px = acc.image().get_pixel(0, 1).0;
        assert_abs_diff_eq!(px[0], 0.5, epsilon = 1e-6);
        assert_abs_diff_eq!(px[1], 0.5, epsilon = 1e-6);
        assert_eq!(acc.frame_count(), 3);
    }

    #[test]
    fn mismatched_frames_are_ignored() {
        let mut acc = FrameAccumulator::new(2, 2);
        acc.blend(&Rgb32FImage::new(3, 2));
        assert_eq!(acc.frame_count(), 0);
    }
}
