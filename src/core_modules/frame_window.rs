// THEORY:
// The `FrameWindow` holds the three most recent frames of a stream, which is
// exactly what three-frame differencing needs. It is a fixed three-slot ring
// buffer: stacking a frame overwrites the oldest slot and advances the head, so no
// frame is ever copied.
//
// The very first frame is placed in all three slots to establish a zero-motion
// baseline. Until the first real shift the window is "cold": oldest and newest are
// the same frame, there is no temporal difference to measure, and the pipeline
// skips detection. An explicit `warmed_up` flag records this state rather than
// comparing frame identity.

use crate::core_modules::frame::{Frame, FrameShape};

pub const WINDOW_SIZE: usize = 3;

#[derive(Debug, Default)]
pub struct FrameWindow {
    slots: [Option<Frame>; WINDOW_SIZE],
    /// Index of the oldest slot.
    head: usize,
    warmed_up: bool,
}

impl FrameWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `frame` as the newest entry, releasing the oldest one.
    pub fn stack(&mut self, frame: Frame) {
        if !self.is_initialized() {
            self.slots = [Some(frame.clone()), Some(frame.clone()), Some(frame)];
            self.head = 0;
            self.warmed_up = false;
            return;
        }

        self.slots[self.head] = Some(frame);
        self.head = (self.head + 1) % WINDOW_SIZE;
        self.warmed_up = true;
    }

    /// The current frames ordered oldest to newest, or `None` before the first stack.
    pub fn frames(&self) -> Option<[&Frame; WINDOW_SIZE]> {
        Some([self.slot(0)?, self.slot(1)?, self.slot(2)?])
    }

    pub fn newest(&self) -> Option<&Frame> {
        self.slot(WINDOW_SIZE - 1)
    }

    pub fn newest_shape(&self) -> Option<FrameShape> {
        self.newest().map(Frame::shape)
    }

    pub fn is_initialized(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// False until at least one frame has been stacked on top of the baseline.
    pub fn is_warmed_up(&self) -> bool {
        self.warmed_up
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    fn slot(&self, age_rank: usize) -> Option<&Frame> {
        self.slots[(self.head + age_rank) % WINDOW_SIZE].as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    fn solid(value: u8) -> Frame {
        Frame::from(RgbImage::from_pixel(4, 4, Rgb([value, value, value])))
    }

    fn first_bytes(window: &FrameWindow) -> Vec<u8> {
        window
            .frames()
            .expect("window is initialized")
            .iter()
            .map(|frame| frame.as_bytes()[0])
            .collect()
    }

    #[test]
    fn empty_window_exposes_nothing() {
        let window = FrameWindow::new();
        assert!(window.frames().is_none());
        assert!(!window.is_initialized());
        assert!(!window.is_warmed_up());
    }

    #[test]
    fn first_frame_fills_every_slot() {
        let mut window = FrameWindow::new();
        window.stack(solid(7));

        let [oldest, middle, newest] = window.frames().unwrap();
        assert!(oldest.shares_buffer_with(middle));
        assert!(oldest.shares_buffer_with(newest));
        assert!(!window.is_warmed_up());
    }

    #[test]
    fn stacking_shifts_oldest_out() {
        let mut window = FrameWindow::new();
        window.stack(solid(1));
        window.stack(solid(2));
        assert!(window.is_warmed_up());
        assert_eq!(first_bytes(&window), vec![1, 1, 2]);

        window.stack(solid(3));
        window.stack(solid(4));
        assert_eq!(first_bytes(&window), vec![2, 3, 4]);

        window.stack(solid(5));
        assert_eq!(first_bytes(&window), vec![3, 4, 5]);
        assert_eq!(window.newest().unwrap().as_bytes()[0], 5);
    }

    #[test]
    fn reset_returns_to_cold_state() {
        let mut window = FrameWindow::new();
        window.stack(solid(1));
        window.stack(solid(2));
        window.reset();

        assert!(window.frames().is_none());
        assert!(!window.is_warmed_up());
        assert_eq!(window.newest_shape(), None);
    }
}
