//! Overlay drawing on a copy of the frame.

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut, draw_text_mut};
use nalgebra::{Point2, Vector2};
use partsize_aruco::MarkerDetection;

use crate::{AnnotationStyle, Measurement, ObjectContour};

static LABEL_FONT: &[u8] = include_bytes!("../assets/DejaVuSansMono.ttf");

/// Vertical label offsets from the centroid, measured to the text baseline.
const WIDTH_LABEL_DY: f32 = -20.0;
const HEIGHT_LABEL_DY: f32 = 15.0;

/// Draw the marker outline, each contour's rectangle and centroid, and the
/// width/height labels of each measurement. `frame` is left untouched.
pub fn annotate(
    frame: &RgbImage,
    marker: Option<&MarkerDetection>,
    contours: &[ObjectContour],
    measurements: &[Measurement],
    style: &AnnotationStyle,
) -> RgbImage {
    let mut canvas = frame.clone();

    if let Some(marker) = marker {
        let outline = marker.corners.map(|p| Point2::new(p.x as f64, p.y as f64));
        draw_polygon(
            &mut canvas,
            &outline,
            Rgb(style.marker_color),
            style.marker_thickness,
        );
    }

    for contour in contours {
        let Some(rect) = contour.min_area_rect() else {
            continue;
        };
        draw_filled_circle_mut(
            &mut canvas,
            (rect.center.x.round() as i32, rect.center.y.round() as i32),
            style.centroid_radius,
            Rgb(style.centroid_color),
        );
        draw_polygon(
            &mut canvas,
            &rect.corners(),
            Rgb(style.box_color),
            style.box_thickness,
        );
    }

    if !measurements.is_empty() {
        match FontRef::try_from_slice(LABEL_FONT) {
            Ok(font) => {
                for m in measurements {
                    draw_labels(&mut canvas, &font, m, style);
                }
            }
            Err(err) => log::warn!("label font unusable, drawing without text: {err}"),
        }
    }

    canvas
}

fn draw_labels(
    canvas: &mut RgbImage,
    font: &FontRef<'_>,
    m: &Measurement,
    style: &AnnotationStyle,
) {
    let scale = PxScale::from(style.label_scale);
    let x = m.center.x.round() as i32 + style.label_offset_x;
    let top = |dy: f32| (m.center.y as f32 + dy - style.label_scale).round() as i32;
    let color = Rgb(style.label_color);
    draw_text_mut(canvas, color, x, top(WIDTH_LABEL_DY), scale, font, &m.width_label());
    draw_text_mut(canvas, color, x, top(HEIGHT_LABEL_DY), scale, font, &m.height_label());
}

/// Closed polyline with approximate `thickness` in pixels.
fn draw_polygon(canvas: &mut RgbImage, points: &[Point2<f64>], color: Rgb<u8>, thickness: u32) {
    let n = points.len();
    let t = thickness.max(1) as i32;
    let half = (t - 1) as f64 / 2.0;
    for i in 0..n {
        let a = points[i];
        let b = points[(i + 1) % n];
        let d = b - a;
        let len = d.norm();
        if len < 1e-9 {
            continue;
        }
        let normal = Vector2::new(-d.y, d.x) / len;
        for k in 0..t {
            let off = normal * (k as f64 - half);
            let (pa, pb) = (a + off, b + off);
            draw_line_segment_mut(
                canvas,
                (pa.x as f32, pa.y as f32),
                (pb.x as f32, pb.y as f32),
                color,
            );
        }
        if t > 2 {
            draw_filled_circle_mut(
                canvas,
                (a.x.round() as i32, a.y.round() as i32),
                t / 2,
                color,
            );
        }
    }
}
