// THEORY:
// The `ObjectExtractor` is the spatial grouping layer. It reads the binary motion
// mask and turns every coherent region of moving pixels into a `DetectedObject`
// holding the region's outer border, its enclosed area and its bounding box.
//
// Key principles:
// 1.  **Outer borders only**: holes and anything nested inside them are ignored.
//     A bounding box is all the later layers need, so interior structure is noise.
// 2.  **Selection policy**: `DetectionOptions` is a set of independent flags. The
//     range flags filter candidates by area (both bounds exclusive, in-range when
//     neither range flag is set), the extremal flags then keep only the largest
//     and/or smallest survivor. Setting every
//     flag (`DetectionOptions::ALL`) accepts every region untouched.
// 3.  **Stateless Utility**: extraction is a pure function of the mask and the
//     options; objects come out in discovery (raster) order.

use crate::core_modules::contour::{BoundingRect, Point};
use crate::error::{MotionError, Result};
use std::ops::{BitOr, BitOrAssign};

/// Exclusive area bounds `(min, max)` a detected region must fall into.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AreaRange {
    pub min: f64,
    pub max: f64,
}

impl AreaRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// `min < area < max`.
    pub fn contains(&self, area: f64) -> bool {
        area > self.min && area < self.max
    }

    pub fn validate(&self) -> Result<()> {
        if self.min.is_nan() || self.max.is_nan() || self.min >= self.max {
            return Err(MotionError::InvalidConfig(format!(
                "area range needs min < max, got [{}, {})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl Default for AreaRange {
    fn default() -> Self {
        Self::new(0.0, 20000.0)
    }
}

/// Which detected regions survive extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DetectionOptions {
    pub in_range: bool,
    pub out_of_range: bool,
    pub largest: bool,
    pub smallest: bool,
}

impl DetectionOptions {
    pub const NONE: Self = Self {
        in_range: false,
        out_of_range: false,
        largest: false,
        smallest: false,
    };
    pub const IN_RANGE: Self = Self {
        in_range: true,
        ..Self::NONE
    };
    pub const OUT_OF_RANGE: Self = Self {
        out_of_range: true,
        ..Self::NONE
    };
    pub const LARGEST: Self = Self {
        largest: true,
        ..Self::NONE
    };
    pub const SMALLEST: Self = Self {
        smallest: true,
        ..Self::NONE
    };
    pub const ALL: Self = Self {
        in_range: true,
        out_of_range: true,
        largest: true,
        smallest: true,
    };

    /// True when every flag set in `other` is also set in `self`.
    pub fn contains(self, other: Self) -> bool {
        (self | other) == self
    }

    pub fn accepts_all(self) -> bool {
        self.contains(Self::ALL)
    }

    fn passes_area_filter(self, range: &AreaRange, area: f64) -> bool {
        match (self.in_range, self.out_of_range) {
            (false, true) => !range.contains(area),
            (true, true) => true,
            // Without a range flag the default in-range filter applies.
            (_, false) => range.contains(area),
        }
    }
}

impl Default for DetectionOptions {
    fn default() -> Self {
        Self::IN_RANGE
    }
}

impl BitOr for DetectionOptions {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self {
            in_range: self.in_range || rhs.in_range,
            out_of_range: self.out_of_range || rhs.out_of_range,
            largest: self.largest || rhs.largest,
            smallest: self.smallest || rhs.smallest,
        }
    }
}

impl BitOrAssign for DetectionOptions {
    fn bitor_assign(&mut self, rhs: Self) {
        *self = *self | rhs;
    }
}

/// A region of motion found in a single frame. Not persistent across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedObject {
    /// Outer border, compressed to the end points of its straight runs.
    pub contour: Vec<Point>,
    /// Area enclosed by `contour`.
    pub area: f64,
    pub bounding_rect: BoundingRect,
}

pub mod object_extractor {
    use super::*;
    use crate::core_modules::contour::find_external_contours;
    use imageproc::geometry::contour_area;
    use crate::core_modules::motion_mask::MotionMask;
    use log::trace;

    /// Finds every moving region in `mask` and applies the selection policy.
    pub fn extract_objects(
        mask: &MotionMask,
        range: &AreaRange,
        options: DetectionOptions,
    ) -> Vec<DetectedObject> {
        let contours = find_external_contours(mask);
        let found = contours.len();

        let candidates: Vec<(Vec<Point>, f64)> = contours
            .into_iter()
            .map(|contour| {
                let area = contour_area(&contour);
                (contour, area)
            })
            .collect();

        let selected = if options.accepts_all() {
            candidates
        } else {
            select(candidates, range, options)
        };

        trace!("{} of {found} contours kept with {options:?}", selected.len());

        selected
            .into_iter()
            .filter_map(|(contour, area)| {
                let bounding_rect = BoundingRect::from_points(&contour)?;
                Some(DetectedObject {
                    contour,
                    area,
                    bounding_rect,
                })
            })
            .collect()
    }

    fn select(
        candidates: Vec<(Vec<Point>, f64)>,
        range: &AreaRange,
        options: DetectionOptions,
    ) -> Vec<(Vec<Point>, f64)> {
        let filtered: Vec<(Vec<Point>, f64)> = candidates
            .into_iter()
            .filter(|(_, area)| options.passes_area_filter(range, *area))
            .collect();

        if !options.largest && !options.smallest {
            return filtered;
        }

        // Ties resolve to the first region discovered.
        let mut largest: Option<usize> = None;
        let mut smallest: Option<usize> = None;
        for (i, (_, area)) in filtered.iter().enumerate() {
            if largest.is_none_or(|l| *area > filtered[l].1) {
                largest = Some(i);
            }
            if smallest.is_none_or(|s| *area < filtered[s].1) {
                smallest = Some(i);
            }
        }

        filtered
            .into_iter()
            .enumerate()
            .filter(|(i, _)| {
                (options.largest && largest == Some(*i)) || (options.smallest && smallest == Some(*i))
            })
            .map(|(_, candidate)| candidate)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::object_extractor::extract_objects;
    use super::*;
    use image::{GrayImage, Luma};

    // Squares of side 5, 10 and 20 on one row; their traced areas are 16, 81 and 361.
    fn three_squares() -> GrayImage {
        let squares = [(2u32, 5u32), (15, 10), (35, 20)];
        GrayImage::from_fn(80, 40, |x, y| {
            let inside = squares
                .iter()
                .any(|&(left, side)| x >= left && x < left + side && y >= 2 && y < 2 + side);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    fn areas(objects: &[DetectedObject]) -> Vec<f64> {
        objects.iter().map(|o| o.area).collect()
    }

    #[test]
    fn range_bounds_are_exclusive() {
        let mask = three_squares();
        let objects = extract_objects(&mask, &AreaRange::new(16.0, 361.0), DetectionOptions::IN_RANGE);
        assert_eq!(areas(&objects), vec![81.0]);

        let objects = extract_objects(&mask, &AreaRange::new(15.0, 362.0), DetectionOptions::IN_RANGE);
        assert_eq!(areas(&objects), vec![16.0, 81.0, 361.0]);
    }

    #[test]
    fn accept_all_ignores_range_and_extremes() {
        let objects = extract_objects(&three_squares(), &AreaRange::new(1000.0, 2000.0), DetectionOptions::ALL);
        assert_eq!(areas(&objects), vec![16.0, 81.0, 361.0]);
    }

    #[test]
    fn extremal_flags_pick_from_the_filtered_set() {
        let mask = three_squares();
        let range = AreaRange::new(0.0, 300.0);

        let largest = extract_objects(&mask, &range, DetectionOptions::IN_RANGE | DetectionOptions::LARGEST);
        assert_eq!(areas(&largest), vec![81.0]);

        let smallest = extract_objects(&mask, &range, DetectionOptions::IN_RANGE | DetectionOptions::SMALLEST);
        assert_eq!(areas(&smallest), vec![16.0]);

        let both = extract_objects(
            &mask,
            &AreaRange::default(),
            DetectionOptions::IN_RANGE | DetectionOptions::LARGEST | DetectionOptions::SMALLEST,
        );
        assert_eq!(areas(&both), vec![16.0, 361.0]);
    }

    #[test]
    fn out_of_range_keeps_the_outliers() {
        let objects = extract_objects(&three_squares(), &AreaRange::new(20.0, 100.0), DetectionOptions::OUT_OF_RANGE);
        assert_eq!(areas(&objects), vec![16.0, 361.0]);
    }

    #[test]
    fn extremal_flags_alone_stay_inside_the_range() {
        let mask = three_squares();
        let range = AreaRange::new(20.0, 100.0);

        let largest = extract_objects(&mask, &range, DetectionOptions::LARGEST);
        assert_eq!(areas(&largest), vec![81.0]);

        let smallest = extract_objects(&mask, &range, DetectionOptions::SMALLEST);
        assert_eq!(areas(&smallest), vec![81.0]);

        let none = extract_objects(&mask, &range, DetectionOptions::NONE);
        assert_eq!(areas(&none), vec![81.0]);
    }

    #[test]
    fn both_range_flags_keep_every_area() {
        let options = DetectionOptions::IN_RANGE | DetectionOptions::OUT_OF_RANGE;
        let objects = extract_objects(&three_squares(), &AreaRange::new(20.0, 100.0), options);
        assert_eq!(areas(&objects), vec![16.0, 81.0, 361.0]);
    }

    #[test]
    fn objects_carry_their_bounding_boxes() {
        let objects = extract_objects(&three_squares(), &AreaRange::default(), DetectionOptions::default());
        let rects: Vec<BoundingRect> = objects.iter().map(|o| o.bounding_rect).collect();
        assert_eq!(
            rects,
            vec![
                BoundingRect::new(2, 2, 5, 5),
                BoundingRect::new(15, 2, 10, 10),
                BoundingRect::new(35, 2, 20, 20)
            ]
        );
    }

    #[test]
    fn extraction_is_idempotent() {
        let mask = three_squares();
        let first = extract_objects(&mask, &AreaRange::default(), DetectionOptions::default());
        let second = extract_objects(&mask, &AreaRange::default(), DetectionOptions::default());
        assert_eq!(first, second);
    }

    #[test]
    fn empty_mask_yields_nothing() {
        let mask = GrayImage::new(16, 16);
        assert!(extract_objects(&mask, &AreaRange::default(), DetectionOptions::ALL).is_empty());
    }

    #[test]
    fn options_combine_like_flags() {
        let mut options = DetectionOptions::IN_RANGE;
        options |= DetectionOptions::LARGEST;
        assert!(options.contains(DetectionOptions::LARGEST));
        assert!(!options.accepts_all());
        assert!((options | DetectionOptions::OUT_OF_RANGE | DetectionOptions::SMALLEST).accepts_all());
        assert_eq!(DetectionOptions::default(), DetectionOptions::IN_RANGE);
    }

    #[test]
    fn inverted_range_is_rejected() {
        assert!(AreaRange::new(10.0, 10.0).validate().is_err());
        assert!(AreaRange::default().validate().is_ok());
    }
}
