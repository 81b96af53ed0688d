// THEORY:
// The `DirectionEstimator` adds memory to the engine. It keeps a bounded history of
// the per-frame aggregate centroids and infers the net drift of the scene's motion
// from it.
//
// 1.  **Accumulated drift**: the translation is the sum of `history[i] - history[i+1]`
//     over every adjacent pair. It covers the whole retained history, so a recent
//     reversal only partially cancels the earlier drift.
// 2.  **Coarse label**: a negative horizontal translation means the mass moved
//     towards larger x, reported as `Right`; anything else is `Left`.
// 3.  **Hard reset**: once the history holds more than `capacity` entries it is
//     cleared entirely (not rolled), and tracking restarts from the next detection.

use crate::core_modules::weighted_centroid::WeightedCentroid;
use crate::error::{MotionError, Result};
use log::debug;
use std::fmt;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Net displacement accumulated over the motion history.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Translation {
    pub x: f64,
    pub y: f64,
}

impl Translation {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn direction(&self) -> Direction {
        if self.x < 0.0 {
            Direction::Right
        } else {
            Direction::Left
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    Left,
    Right,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => f.write_str("left"),
            Direction::Right => f.write_str("right"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionEstimate {
    pub translation: Translation,
    pub direction: Direction,
}

/// Sums `history[i] - history[i + 1]` over every adjacent pair, positions only.
pub fn accumulate_translation(history: &[WeightedCentroid]) -> Translation {
    history
        .windows(2)
        .fold(Translation::default(), |acc, pair| {
            let step = pair[0] - pair[1];
            Translation::new(acc.x + step.x, acc.y + step.y)
        })
}

/// Owns the motion history of one stream.
#[derive(Debug, Clone)]
pub struct DirectionEstimator {
    history: Vec<WeightedCentroid>,
    capacity: usize,
}

impl DirectionEstimator {
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(MotionError::InvalidConfig(
                "history capacity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            history: Vec::with_capacity(capacity + 1),
            capacity,
        })
    }

    /// Records the centroid of the current frame and estimates the direction.
    pub fn update(&mut self, centroid: WeightedCentroid) -> DirectionEstimate {
        self.history.push(centroid);

        let translation = accumulate_translation(&self.history);
        let direction = translation.direction();

        if self.history.len() > self.capacity {
            debug!(
                "motion history exceeded {} entries, starting over",
                self.capacity
            );
            self.history.clear();
        }

        DirectionEstimate {
            translation,
            direction,
        }
    }

    pub fn history(&self) -> &[WeightedCentroid] {
        &self.history
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn reset(&mut self) {
        self.history.clear();
    }
}

impl Default for DirectionEstimator {
    fn default() -> Self {
        Self {
            history: Vec::with_capacity(DEFAULT_HISTORY_CAPACITY + 1),
            capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}
