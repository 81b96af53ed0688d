// THEORY:
// A `WeightedCentroid` summarizes one or many detected objects as a single point
// plus a size-derived weight. For a bounding rectangle the position is its center
// and the weight is `width + height`, a cheap perimeter-like proxy that stays
// stable for elongated objects and is what the overlay uses as a circle radius.
//
// All detections of a frame are folded into one aggregate: the arithmetic mean of
// the per-rectangle centroids, position and weight alike. An empty frame has no
// aggregate at all.

use crate::core_modules::contour::BoundingRect;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub, SubAssign};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WeightedCentroid {
    pub x: f64,
    pub y: f64,
    pub weight: f64,
}

impl WeightedCentroid {
    pub fn new(x: f64, y: f64, weight: f64) -> Self {
        Self { x, y, weight }
    }

    /// Center of the rectangle weighted by `width + height`. Halving is done in
    /// integer pixel coordinates.
    pub fn from_rect(rect: &BoundingRect) -> Self {
        Self {
            x: ((rect.left() + rect.right()) / 2) as f64,
            y: ((rect.top() + rect.bottom()) / 2) as f64,
            weight: (rect.width + rect.height) as f64,
        }
    }

    pub fn position(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

/// Mean of the rectangles' centroids, or `None` when there is nothing to aggregate.
pub fn aggregate<'a>(rects: impl IntoIterator<Item = &'a BoundingRect>) -> Option<WeightedCentroid> {
    let (sum, count) = rects
        .into_iter()
        .fold((WeightedCentroid::default(), 0usize), |(sum, count), rect| {
            (sum + WeightedCentroid::from_rect(rect), count + 1)
        });

    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

impl Add for WeightedCentroid {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.weight + rhs.weight)
    }
}

impl Sub for WeightedCentroid {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.weight - rhs.weight)
    }
}

impl Mul<f64> for WeightedCentroid {
    type Output = Self;

    fn mul(self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor, self.weight * factor)
    }
}

impl Div<f64> for WeightedCentroid {
    type Output = Self;

    fn div(self, divisor: f64) -> Self {
        Self::new(self.x / divisor, self.y / divisor, self.weight / divisor)
    }
}

impl AddAssign for WeightedCentroid {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for WeightedCentroid {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl MulAssign<f64> for WeightedCentroid {
    fn mul_assign(&mut self, factor: f64) {
        *self = *self * factor;
    }
}

impl DivAssign<f64> for WeightedCentroid {
    fn div_assign(&mut self, divisor: f64) {
        *self = *self / divisor;
    }
}

impl Sum for WeightedCentroid {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}
