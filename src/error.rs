// THEORY:
// Every fallible operation in the engine reports through `MotionError`. The only
// conditions that are genuinely errors are malformed input (a frame whose buffer
// does not match its declared shape, or a frame whose shape disagrees with the
// rest of the window) and an unusable configuration. The normal "nothing to
// report" outcomes of a detection cycle are carried as data in `FrameAnalysis`
// (see `FrameStatus`), never as an error.

use crate::core_modules::frame::FrameShape;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MotionError {
    /// Frames inside one detection cycle must share width, height and channel count.
    #[error("frame shape mismatch: expected {expected}, got {actual}")]
    InputShapeMismatch {
        expected: FrameShape,
        actual: FrameShape,
    },
    #[error("malformed frame: {0}")]
    MalformedFrame(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// Failures of the async pipeline worker.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error(transparent)]
    Motion(#[from] MotionError),
    #[error("pipeline worker is no longer running")]
    Closed,
    #[error("pipeline worker panicked: {0}")]
    Panicked(String),
}

pub type Result<T, E = MotionError> = std::result::Result<T, E>;
