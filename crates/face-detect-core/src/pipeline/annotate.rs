//! Annotator: burns face rectangles into a bitmap.

use anyhow::Result;
use image::Rgb;
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;

use crate::domain::{Bitmap, Detection, FaceBox};
use crate::ports::FaceDetector;

/// Rectangle color, in bitmap (blue, green, red) order: pure green.
pub const FACE_BOX_COLOR: [u8; 3] = [0, 255, 0];

/// Rectangle stroke width in pixels.
pub const STROKE_WIDTH: u32 = 2;

/// How rectangles are drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationStyle {
    /// Stroke color in bitmap channel order.
    pub color: [u8; 3],
    /// Stroke width in pixels; the stroke grows inward from the box edges.
    pub stroke: u32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            color: FACE_BOX_COLOR,
            stroke: STROKE_WIDTH,
        }
    }
}

/// Draws an unfilled rectangle for every box, in place.
///
/// Each rectangle spans `(x, y)` to `(x + width, y + height)` inclusive.
/// Boxes are not clipped or validated; pixels that fall outside the bitmap
/// are simply not painted. Returns the same bitmap it was given.
pub fn annotate<'a, 'b>(
    bitmap: &'a mut Bitmap,
    boxes: impl IntoIterator<Item = &'b FaceBox>,
    style: &AnnotationStyle,
) -> &'a mut Bitmap {
    let color = Rgb(style.color);
    for face in boxes {
        for inset in 0..style.stroke {
            let Some(rect) = inset_rect(face, inset) else {
                break;
            };
            draw_hollow_rect_mut(bitmap.buffer_mut(), rect, color);
        }
    }
    bitmap
}

/// Runs the detector on `bitmap` and returns an annotated copy.
///
/// The input is never mutated; annotation happens on a fresh copy so the
/// acquired bitmap is not aliased by the displayed one.
///
/// # Errors
///
/// Propagates detector failures.
pub fn detect_and_annotate(
    detector: &dyn FaceDetector,
    bitmap: &Bitmap,
    style: &AnnotationStyle,
) -> Result<(Bitmap, Vec<Detection>)> {
    let detections = detector.detect(bitmap)?;
    let mut annotated = bitmap.clone();
    annotate(&mut annotated, detections.iter().map(|d| &d.bbox), style);
    Ok((annotated, detections))
}

/// The rectangle traced by stroke ring `inset` of `face`, if it has any area.
fn inset_rect(face: &FaceBox, inset: u32) -> Option<Rect> {
    let inset = i64::from(inset);
    let width = i64::from(face.width) + 1 - 2 * inset;
    let height = i64::from(face.height) + 1 - 2 * inset;
    if width <= 0 || height <= 0 {
        return None;
    }

    let left = i32::try_from(i64::from(face.x) + inset).ok()?;
    let top = i32::try_from(i64::from(face.y) + inset).ok()?;
    // Keep right/bottom representable as i32.
    let width = width.min(i64::from(i32::MAX) - i64::from(left));
    let height = height.min(i64::from(i32::MAX) - i64::from(top));
    if width <= 0 || height <= 0 {
        return None;
    }

    Some(Rect::at(left, top).of_size(u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}
