// THEORY:
// The motion mask layer turns the three frames of the window into a single-channel
// binary image that marks "moving" pixels. It implements three-frame differencing:
//
// 1.  `|b - a|` and `|c - b|` are computed byte by byte over every channel.
// 2.  The two differences are combined with a bitwise AND, so a pixel survives only
//     if it changed across *both* consecutive transitions. A one-off sensor spike or
//     the ghost left behind by a single transition is suppressed.
// 3.  Each channel of the combined difference is thresholded on its own and the
//     channel results are ORed together. Motion that is strong in a single color
//     channel is kept, while per-channel noise under the cutoff is dropped.
//
// The layer is stateless: the same three frames always produce the same mask.

use crate::core_modules::frame::{Frame, FrameShape};
use crate::error::{MotionError, Result};
use image::{GrayImage, Luma};
use imageproc::contrast::{ThresholdType, threshold};
use log::trace;

/// Per-channel intensity a combined difference must exceed to count as motion.
pub const MOTION_THRESHOLD: u8 = 45;

/// Single-channel binary image; every pixel is either 0 or 255.
pub type MotionMask = GrayImage;

/// Builds the motion mask for three frames ordered oldest to newest.
pub fn generate(frames: [&Frame; 3], cutoff: u8) -> Result<MotionMask> {
    let [a, b, c] = frames;
    let shape = a.shape();
    let raw = step_difference(a, b, c)?;
    trace!("step difference computed for {shape} frames");
    Ok(threshold_channels(&raw, shape, cutoff))
}

/// `|b - a| & |c - b|` for every byte of the three frames.
pub fn step_difference(a: &Frame, b: &Frame, c: &Frame) -> Result<Vec<u8>> {
    ensure_same_shape(a, b)?;
    ensure_same_shape(a, c)?;

    let raw = a
        .as_bytes()
        .iter()
        .zip(b.as_bytes())
        .zip(c.as_bytes())
        .map(|((&a, &b), &c)| b.abs_diff(a) & c.abs_diff(b))
        .collect();
    Ok(raw)
}

/// Thresholds every channel of an interleaved buffer and ORs the results into one mask.
pub fn threshold_channels(raw: &[u8], shape: FrameShape, cutoff: u8) -> MotionMask {
    let mut mask = GrayImage::new(shape.width, shape.height);

    for channel in 0..shape.channels as usize {
        let plane = channel_plane(raw, shape, channel);
        let binary = threshold(&plane, cutoff, ThresholdType::Binary);
        for (combined, value) in mask.pixels_mut().zip(binary.pixels()) {
            combined.0[0] |= value.0[0];
        }
    }

    mask
}

fn channel_plane(raw: &[u8], shape: FrameShape, channel: usize) -> GrayImage {
    let channels = shape.channels as usize;
    let width = shape.width as usize;
    GrayImage::from_fn(shape.width, shape.height, |x, y| {
        Luma([raw[(y as usize * width + x as usize) * channels + channel]])
    })
}

fn ensure_same_shape(expected: &Frame, actual: &Frame) -> Result<()> {
    if expected.shape() == actual.shape() {
        Ok(())
    } else {
        Err(MotionError::InputShapeMismatch {
            expected: expected.shape(),
            actual: actual.shape(),
        })
    }
}
