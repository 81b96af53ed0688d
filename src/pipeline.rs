// THEORY:
// The `pipeline` module is the top-level API of the motion tracker. It wires the
// layers together into one detection cycle per incoming frame:
//
//   FrameWindow -> motion mask -> ObjectExtractor -> centroid aggregate -> DirectionEstimator
//
// A `MotionPipeline` holds all per-stream state (the frame window and the motion
// history) and mutates it only from `ingest_frame`, strictly in frame order. Every
// outcome of a cycle is reported as data in a `FrameAnalysis`; the only errors are
// frames that cannot enter the window. A rejected frame leaves all state untouched,
// so the caller simply moves on to the next one.

use crate::core_modules::frame::Frame;
use crate::core_modules::frame_window::FrameWindow;
use crate::core_modules::motion_history::DirectionEstimator;
use crate::core_modules::motion_mask::{self, MOTION_THRESHOLD, MotionMask};
use crate::core_modules::object_extractor::object_extractor;
use crate::core_modules::weighted_centroid;
use crate::error::{MotionError, Result};
use log::{debug, trace, warn};

// Re-export key data structures for the public API.
pub use crate::core_modules::motion_history::{
    DEFAULT_HISTORY_CAPACITY, Direction, DirectionEstimate, Translation,
};
pub use crate::core_modules::object_extractor::{AreaRange, DetectedObject, DetectionOptions};
pub use crate::core_modules::weighted_centroid::WeightedCentroid;

/// Configuration for the MotionPipeline, fixed for the lifetime of a stream.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PipelineConfig {
    /// Exclusive area bounds used by the range detection options.
    pub area_range: AreaRange,
    pub detection_options: DetectionOptions,
    /// Number of centroids the motion history holds before it is cleared.
    /// Should be at least the stream's frame rate.
    pub history_capacity: usize,
    /// Per-channel cutoff applied to the three-frame difference.
    pub mask_threshold: u8,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            area_range: AreaRange::default(),
            detection_options: DetectionOptions::default(),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            mask_threshold: MOTION_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn validate(&self) -> Result<()> {
        self.area_range.validate()?;
        if self.history_capacity == 0 {
            return Err(MotionError::InvalidConfig(
                "history capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// How far a detection cycle got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FrameStatus {
    /// The window has no temporal difference yet; detection was skipped.
    WarmingUp,
    /// Detection ran but no region survived the selection policy.
    NoObjects,
    /// Objects were found and their aggregate was added to the motion history.
    Tracked,
}

/// The output of the pipeline for a single frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameAnalysis {
    pub status: FrameStatus,
    pub motion_detected: bool,
    pub objects: Vec<DetectedObject>,
    pub aggregate: Option<WeightedCentroid>,
    /// Drift accumulated over the motion history; zero when nothing was tracked.
    pub translation: Translation,
    pub direction: Option<Direction>,
    /// Frame center minus aggregate position.
    pub center_offset: Option<(f64, f64)>,
}

impl FrameAnalysis {
    fn without_motion(status: FrameStatus) -> Self {
        Self {
            status,
            motion_detected: false,
            objects: Vec::new(),
            aggregate: None,
            translation: Translation::default(),
            direction: None,
            center_offset: None,
        }
    }
}

/// The main, top-level struct of the motion tracker. One instance per stream.
#[derive(Debug)]
pub struct MotionPipeline {
    config: PipelineConfig,
    window: FrameWindow,
    estimator: DirectionEstimator,
    last_mask: Option<MotionMask>,
    in_motion: bool,
    frames_ingested: u64,
}

impl MotionPipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        let estimator = DirectionEstimator::new(config.history_capacity)?;
        Ok(Self {
            config,
            window: FrameWindow::new(),
            estimator,
            last_mask: None,
            in_motion: false,
            frames_ingested: 0,
        })
    }

    /// Runs one detection cycle with `frame` as the newest frame of the stream.
    pub fn ingest_frame(&mut self, frame: Frame) -> Result<FrameAnalysis> {
        if let Some(expected) = self.window.newest_shape() {
            if expected != frame.shape() {
                warn!("rejecting {} frame, stream is {expected}", frame.shape());
                return Err(MotionError::InputShapeMismatch {
                    expected,
                    actual: frame.shape(),
                });
            }
        }

        let (width, height) = (frame.width(), frame.height());
        self.window.stack(frame);
        self.frames_ingested += 1;

        // Stage 1: Temporal Differencing
        let frames = match self.window.frames() {
            Some(frames) if self.window.is_warmed_up() => frames,
            _ => {
                trace!("frame {} fills the window baseline", self.frames_ingested);
                self.last_mask = None;
                self.in_motion = false;
                return Ok(FrameAnalysis::without_motion(FrameStatus::WarmingUp));
            }
        };
        let mask = motion_mask::generate(frames, self.config.mask_threshold)?;

        // Stage 2: Object Extraction
        let objects = object_extractor::extract_objects(
            &mask,
            &self.config.area_range,
            self.config.detection_options,
        );
        self.last_mask = Some(mask);

        // Stage 3: Aggregation
        let Some(aggregate) =
            weighted_centroid::aggregate(objects.iter().map(|object| &object.bounding_rect))
        else {
            trace!("frame {}: no moving objects", self.frames_ingested);
            self.in_motion = false;
            return Ok(FrameAnalysis::without_motion(FrameStatus::NoObjects));
        };

        // Stage 4: Direction Estimation
        let estimate = self.estimator.update(aggregate);
        let center_offset = (
            (width / 2) as f64 - aggregate.x,
            (height / 2) as f64 - aggregate.y,
        );

        debug!(
            "frame {}: {} object(s), centroid ({:.1}, {:.1}) weight {:.1}, moving {}",
            self.frames_ingested,
            objects.len(),
            aggregate.x,
            aggregate.y,
            aggregate.weight,
            estimate.direction
        );

        self.in_motion = true;
        Ok(FrameAnalysis {
            status: FrameStatus::Tracked,
            motion_detected: true,
            objects,
            aggregate: Some(aggregate),
            translation: estimate.translation,
            direction: Some(estimate.direction),
            center_offset: Some(center_offset),
        })
    }

    /// Whether the last detection cycle found any moving object.
    pub fn in_motion(&self) -> bool {
        self.in_motion
    }

    /// Mask produced by the last cycle that ran detection.
    pub fn last_mask(&self) -> Option<&MotionMask> {
        self.last_mask.as_ref()
    }

    /// The frame the last mask localizes motion in.
    pub fn middle_frame(&self) -> Option<&Frame> {
        self.window.frames().map(|[_, middle, _]| middle)
    }

    pub fn history(&self) -> &[WeightedCentroid] {
        self.estimator.history()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn frames_ingested(&self) -> u64 {
        self.frames_ingested
    }

    /// Drops all stream state, as if no frame had been ingested.
    pub fn reset(&mut self) {
        self.window.reset();
        self.estimator.reset();
        self.last_mask = None;
        self.in_motion = false;
        self.frames_ingested = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const BACKGROUND: Rgb<u8> = Rgb([40, 40, 40]);
    const BRIGHT: Rgb<u8> = Rgb([250, 250, 250]);

    fn blank() -> Frame {
        Frame::from(RgbImage::from_pixel(64, 48, BACKGROUND))
    }

    fn with_square(left: u32, top: u32, side: u32) -> Frame {
        let mut image = RgbImage::from_pixel(64, 48, BACKGROUND);
        for y in top..top + side {
            for x in left..left + side {
                image.put_pixel(x, y, BRIGHT);
            }
        }
        Frame::from(image)
    }

    #[test]
    fn first_frame_only_warms_up() {
        let mut pipeline = MotionPipeline::new(PipelineConfig::default()).unwrap();
        let analysis = pipeline.ingest_frame(blank()).unwrap();
        assert_eq!(analysis.status, FrameStatus::WarmingUp);
        assert!(!analysis.motion_detected);
        assert!(pipeline.last_mask().is_none());
    }

    #[test]
    fn static_scene_reports_no_objects() {
        let mut pipeline = MotionPipeline::new(PipelineConfig::default()).unwrap();
        for _ in 0..3 {
            pipeline.ingest_frame(blank()).unwrap();
        }
        let analysis = pipeline.ingest_frame(blank()).unwrap();
        assert_eq!(analysis.status, FrameStatus::NoObjects);
        assert!(analysis.objects.is_empty());
        assert_eq!(analysis.direction, None);
        assert!(pipeline.history().is_empty());
    }

    #[test]
    fn flash_in_the_middle_frame_is_tracked() {
        let mut pipeline = MotionPipeline::new(PipelineConfig::default()).unwrap();
        pipeline.ingest_frame(blank()).unwrap();
        pipeline.ingest_frame(with_square(20, 10, 10)).unwrap();
        let analysis = pipeline.ingest_frame(blank()).unwrap();

        assert_eq!(analysis.status, FrameStatus::Tracked);
        assert_eq!(analysis.objects.len(), 1);
        assert_eq!(analysis.objects[0].area, 81.0);
        assert_eq!(analysis.aggregate, Some(WeightedCentroid::new(25.0, 15.0, 20.0)));
        assert_eq!(analysis.center_offset, Some((7.0, 9.0)));
        assert_eq!(analysis.direction, Some(Direction::Left));
        assert_eq!(pipeline.history().len(), 1);
        assert!(pipeline.in_motion());
    }

    #[test]
    fn moving_square_drifts_right() {
        let mut pipeline = MotionPipeline::new(PipelineConfig::default()).unwrap();
        let mut last = None;
        for left in [2, 8, 14, 20, 26, 32] {
            last = Some(pipeline.ingest_frame(with_square(left, 10, 6)).unwrap());
        }

        let analysis = last.unwrap();
        assert_eq!(analysis.status, FrameStatus::Tracked);
        assert!(analysis.translation.x < 0.0);
        assert_eq!(analysis.direction, Some(Direction::Right));
    }

    #[test]
    fn mismatched_frame_is_rejected_without_side_effects() {
        let mut pipeline = MotionPipeline::new(PipelineConfig::default()).unwrap();
        pipeline.ingest_frame(blank()).unwrap();
        pipeline.ingest_frame(blank()).unwrap();

        let odd = Frame::from(RgbImage::new(10, 10));
        assert!(matches!(
            pipeline.ingest_frame(odd),
            Err(MotionError::InputShapeMismatch { .. })
        ));
        assert_eq!(pipeline.frames_ingested(), 2);

        let analysis = pipeline.ingest_frame(blank()).unwrap();
        assert_eq!(analysis.status, FrameStatus::NoObjects);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = PipelineConfig {
            history_capacity: 0,
            ..PipelineConfig::default()
        };
        assert!(matches!(
            MotionPipeline::new(config),
            Err(MotionError::InvalidConfig(_))
        ));

        let config = PipelineConfig {
            area_range: AreaRange::new(500.0, 100.0),
            ..PipelineConfig::default()
        };
        assert!(MotionPipeline::new(config).is_err());
    }

    #[test]
    fn config_is_kept_as_given() {
        let config = PipelineConfig {
            area_range: AreaRange::new(10.0, 500.0),
            detection_options: DetectionOptions::IN_RANGE | DetectionOptions::LARGEST,
            history_capacity: 30,
            mask_threshold: 20,
        };
        let pipeline = MotionPipeline::new(config.clone()).unwrap();
        assert_eq!(pipeline.config(), &config);
    }

    #[test]
    fn reset_starts_the_stream_over() {
        let mut pipeline = MotionPipeline::new(PipelineConfig::default()).unwrap();
        pipeline.ingest_frame(blank()).unwrap();
        pipeline.ingest_frame(with_square(20, 10, 10)).unwrap();
        pipeline.ingest_frame(blank()).unwrap();
        pipeline.reset();

        assert!(pipeline.history().is_empty());
        assert!(pipeline.middle_frame().is_none());
        let analysis = pipeline.ingest_frame(Frame::from(RgbImage::new(10, 10))).unwrap();
        assert_eq!(analysis.status, FrameStatus::WarmingUp);
    }
}
