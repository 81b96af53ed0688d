// THEORY:
// The overlay is a debugging view of one detection cycle, drawn on top of the frame
// the motion was found in (the middle frame of the window, since three-frame
// differencing localizes motion there):
// - detected regions filled red,
// - their bounding boxes outlined green,
// - a magenta circle around the aggregate centroid and a blue circle around the
//   translation point, both with the aggregate weight as radius.
// It never feeds back into detection.

use crate::core_modules::frame::Frame;
use crate::core_modules::motion_history::Translation;
use crate::core_modules::object_extractor::DetectedObject;
use crate::core_modules::weighted_centroid::WeightedCentroid;
use crate::pipeline::FrameAnalysis;
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_rect_mut, draw_hollow_circle_mut, draw_hollow_rect_mut, draw_polygon_mut,
};
use imageproc::rect::Rect;

pub const OBJECT_COLOR: Rgb<u8> = Rgb([255, 0, 0]);
pub const BOX_COLOR: Rgb<u8> = Rgb([0, 255, 0]);
pub const TRANSLATION_COLOR: Rgb<u8> = Rgb([0, 0, 255]);
pub const CENTROID_COLOR: Rgb<u8> = Rgb([255, 0, 255]);

const BOX_THICKNESS: i32 = 4;
const CIRCLE_THICKNESS: i32 = 2;

/// Copies `frame` to RGB and draws the result of `analysis` on it.
pub fn render(frame: &Frame, analysis: &FrameAnalysis) -> RgbImage {
    let mut canvas = frame.to_rgb_image();
    draw_objects(&mut canvas, &analysis.objects);
    if let Some(centroid) = analysis.aggregate {
        draw_centroid(&mut canvas, &centroid, &analysis.translation);
    }
    canvas
}

pub fn draw_objects(canvas: &mut RgbImage, objects: &[DetectedObject]) {
    for object in objects {
        fill_region(canvas, object);
    }

    for object in objects {
        let rect = object.bounding_rect;
        for t in 0..BOX_THICKNESS {
            let outline = Rect::at(rect.x - t, rect.y - t)
                .of_size(rect.width + 2 * t as u32, rect.height + 2 * t as u32);
            draw_hollow_rect_mut(canvas, outline, BOX_COLOR);
        }
    }
}

pub fn draw_centroid(canvas: &mut RgbImage, centroid: &WeightedCentroid, translation: &Translation) {
    let radius = centroid.weight.round() as i32;
    let (x, y) = centroid.position();
    for t in 0..CIRCLE_THICKNESS {
        draw_hollow_circle_mut(
            canvas,
            (translation.x.round() as i32, translation.y.round() as i32),
            radius + t,
            TRANSLATION_COLOR,
        );
        draw_hollow_circle_mut(
            canvas,
            (x.round() as i32, y.round() as i32),
            radius + t,
            CENTROID_COLOR,
        );
    }
}

fn fill_region(canvas: &mut RgbImage, object: &DetectedObject) {
    let points = &object.contour;
    let is_polygon = points.len() >= 3 && points.first() != points.last();
    if is_polygon {
        draw_polygon_mut(canvas, points, OBJECT_COLOR);
    } else {
        draw_filled_rect_mut(canvas, object.bounding_rect.into(), OBJECT_COLOR);
    }
}
