// THEORY:
// This file is the main entry point for the `motion_tracker` library crate.
//
// The public API is the `MotionPipeline` and its associated data structures
// (`PipelineConfig`, `FrameAnalysis`, ...), plus the `PipelineWorker` for async
// callers. The layers that make up a detection cycle live in `core_modules` and
// stay usable on their own (frame window, motion mask, object extractor, centroid
// aggregation, direction estimation, overlay rendering).

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::frame::{Frame, FrameShape};
pub use error::{MotionError, WorkerError};
pub use parallel_pipeline::PipelineWorker;
pub use pipeline::{FrameAnalysis, FrameStatus, MotionPipeline, PipelineConfig};
