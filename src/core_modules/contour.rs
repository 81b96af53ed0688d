// THEORY:
// Geometry helpers shared by the object extractor and the overlay renderer. Border
// following itself is delegated to `imageproc`; this module narrows its output to
// what the engine needs:
// - only outermost borders (holes and anything nested inside them are ignored),
// - point chains compressed to the end points of their straight runs,
// - the axis-aligned bounding rectangle of a chain.
// Enclosed areas come from `imageproc::geometry::contour_area`.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};

pub type Point = imageproc::point::Point<i32>;

/// Axis-aligned rectangle. `right()` and `bottom()` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundingRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingRect {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle containing every point, or `None` for an empty chain.
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some(Self::new(
            min_x,
            min_y,
            (max_x - min_x + 1) as u32,
            (max_y - min_y + 1) as u32,
        ))
    }

    pub fn left(&self) -> i32 {
        self.x
    }

    pub fn top(&self) -> i32 {
        self.y
    }

    pub fn right(&self) -> i32 {
        self.x + self.width as i32
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height as i32
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left(), self.top())
    }

    pub fn bottom_right(&self) -> Point {
        Point::new(self.right(), self.bottom())
    }
}

impl From<BoundingRect> for imageproc::rect::Rect {
    fn from(rect: BoundingRect) -> Self {
        imageproc::rect::Rect::at(rect.x, rect.y).of_size(rect.width.max(1), rect.height.max(1))
    }
}

/// Outermost borders of every non-zero region of `mask`, in raster discovery order.
pub fn find_external_contours(mask: &GrayImage) -> Vec<Vec<Point>> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|contour| contour.border_type == BorderType::Outer && contour.parent.is_none())
        .map(|contour| compress_chain(contour.points))
        .collect()
}

/// Drops every point sitting in the middle of a straight horizontal, vertical or
/// diagonal run of a closed chain.
pub fn compress_chain(points: Vec<Point>) -> Vec<Point> {
    let n = points.len();
    if n < 3 {
        return points;
    }

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.x - prev.x, cur.y - prev.y) != (next.x - cur.x, next.y - cur.y)
        })
        .map(|i| points[i])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;
    use imageproc::geometry::contour_area;

    fn mask_with(rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        GrayImage::from_fn(60, 40, |x, y| {
            let inside = rects
                .iter()
                .any(|&(rx, ry, w, h)| x >= rx && x < rx + w && y >= ry && y < ry + h);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn square_reduces_to_its_corners() {
        let contours = find_external_contours(&mask_with(&[(20, 10, 10, 10)]));
        assert_eq!(contours.len(), 1);

        let mut corners = contours[0].clone();
        corners.sort_by_key(|p| (p.y, p.x));
        assert_eq!(
            corners,
            vec![
                Point::new(20, 10),
                Point::new(29, 10),
                Point::new(20, 19),
                Point::new(29, 19)
            ]
        );
    }

    #[test]
    fn square_area_and_bounds() {
        let contours = find_external_contours(&mask_with(&[(20, 10, 10, 10)]));
        assert_eq!(contour_area(&contours[0]), 81.0);
        assert_eq!(
            BoundingRect::from_points(&contours[0]),
            Some(BoundingRect::new(20, 10, 10, 10))
        );
    }

    #[test]
    fn holes_are_ignored() {
        let ring = GrayImage::from_fn(30, 30, |x, y| {
            let outer = (5..25).contains(&x) && (5..25).contains(&y);
            let hole = (10..20).contains(&x) && (10..20).contains(&y);
            Luma([if outer && !hole { 255 } else { 0 }])
        });
        assert_eq!(find_external_contours(&ring).len(), 1);
    }

    #[test]
    fn regions_come_out_in_raster_order() {
        let contours = find_external_contours(&mask_with(&[(40, 20, 5, 5), (2, 2, 4, 4)]));
        assert_eq!(contours.len(), 2);
        assert_eq!(BoundingRect::from_points(&contours[0]).unwrap().top_left(), Point::new(2, 2));
        assert_eq!(BoundingRect::from_points(&contours[1]).unwrap().top_left(), Point::new(40, 20));
    }

    #[test]
    fn degenerate_chains_have_no_area() {
        assert_eq!(contour_area::<i32>(&[]), 0.0);
        assert_eq!(contour_area(&[Point::new(1, 1), Point::new(4, 1)]), 0.0);
        assert_eq!(BoundingRect::from_points(&[]), None);
    }

    #[test]
    fn rect_edges_are_exclusive() {
        let rect = BoundingRect::new(3, 4, 10, 20);
        assert_eq!(rect.bottom_right(), Point::new(13, 24));
    }
}
