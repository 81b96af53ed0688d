// THEORY:
// The `Frame` is the most fundamental unit of the engine: a "dumb", immutable
// container for one captured image. It knows its own shape and exposes its bytes,
// nothing more. Comparison between frames is the job of the motion mask layer.
//
// Frames are held by the three-slot window for up to three detection cycles, so the
// pixel bytes live behind an `Arc<[u8]>`. Shifting the window, or filling all of its
// slots with the very first frame, only clones a pointer.

use crate::error::{MotionError, Result};
use image::{DynamicImage, GrayImage, Rgb, RgbImage, RgbaImage};
use std::fmt;
use std::sync::Arc;

/// Width, height and interleaved channel count of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameShape {
    pub width: u32,
    pub height: u32,
    pub channels: u8,
}

impl FrameShape {
    pub fn new(width: u32, height: u32, channels: u8) -> Self {
        Self {
            width,
            height,
            channels,
        }
    }

    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Number of bytes a row-major, channel-interleaved buffer of this shape holds.
    pub fn byte_len(&self) -> usize {
        self.pixel_count() * self.channels as usize
    }
}

impl fmt::Display for FrameShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}x{}", self.width, self.height, self.channels)
    }
}

/// An immutable, cheaply clonable video frame.
#[derive(Debug, Clone)]
pub struct Frame {
    shape: FrameShape,
    data: Arc<[u8]>,
}

impl Frame {
    /// Wraps a raw row-major buffer with `channels` interleaved bytes per pixel.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: impl Into<Arc<[u8]>>) -> Result<Self> {
        let shape = FrameShape::new(width, height, channels);
        if channels == 0 {
            return Err(MotionError::MalformedFrame(
                "a frame needs at least one channel".to_string(),
            ));
        }

        let data = data.into();
        if data.len() != shape.byte_len() {
            return Err(MotionError::MalformedFrame(format!(
                "{shape} frame needs {} bytes, buffer holds {}",
                shape.byte_len(),
                data.len()
            )));
        }

        Ok(Self { shape, data })
    }

    pub fn shape(&self) -> FrameShape {
        self.shape
    }

    pub fn width(&self) -> u32 {
        self.shape.width
    }

    pub fn height(&self) -> u32 {
        self.shape.height
    }

    pub fn channels(&self) -> u8 {
        self.shape.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// True when both frames share the same underlying pixel buffer.
    pub fn shares_buffer_with(&self, other: &Frame) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Renders the frame as RGB for drawing. Single-channel frames are expanded to
    /// gray, frames with more than three channels keep their first three.
    pub fn to_rgb_image(&self) -> RgbImage {
        let width = self.shape.width;
        let channels = self.shape.channels as usize;
        RgbImage::from_fn(self.shape.width, self.shape.height, |x, y| {
            let offset = (y as usize * width as usize + x as usize) * channels;
            let px = &self.data[offset..offset + channels];
            if channels >= 3 {
                Rgb([px[0], px[1], px[2]])
            } else {
                Rgb([px[0], px[0], px[0]])
            }
        })
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            shape: FrameShape::new(width, height, 3),
            data: image.into_raw().into(),
        }
    }
}

impl From<RgbaImage> for Frame {
    fn from(image: RgbaImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            shape: FrameShape::new(width, height, 4),
            data: image.into_raw().into(),
        }
    }
}

impl From<GrayImage> for Frame {
    fn from(image: GrayImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            shape: FrameShape::new(width, height, 1),
            data: image.into_raw().into(),
        }
    }
}

impl From<DynamicImage> for Frame {
    fn from(image: DynamicImage) -> Self {
        match image {
            DynamicImage::ImageLuma8(gray) => gray.into(),
            DynamicImage::ImageRgba8(rgba) => rgba.into(),
            other => other.to_rgb8().into(),
        }
    }
}
