//! Foreground segmentation against a homogeneous background.

use image::{GrayImage, Luma, RgbImage};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::convex_hull;
use imageproc::point::Point;
use nalgebra::Point2;
use partsize_core::{centroid, polygon_area, RotatedRect};
use serde::Serialize;

use crate::SegmentParams;

#[cfg(feature = "tracing")]
use tracing::instrument;

/// One closed foreground boundary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectContour {
    /// Boundary pixels in tracing order.
    pub points: Vec<Point2<i32>>,
    /// Shoelace area of the boundary polygon.
    pub area_px: f64,
}

impl ObjectContour {
    pub fn from_points(points: Vec<Point2<i32>>) -> Self {
        let area_px = polygon_area(&to_f64(&points));
        Self { points, area_px }
    }

    /// Vertex average of the boundary.
    pub fn centroid(&self) -> Option<Point2<f64>> {
        centroid(&to_f64(&self.points))
    }

    /// Minimum-area enclosing rectangle of the boundary.
    pub fn min_area_rect(&self) -> Option<RotatedRect> {
        let pts: Vec<Point<i32>> = self.points.iter().map(|p| Point::new(p.x, p.y)).collect();
        let hull: Vec<Point2<f64>> = convex_hull(pts.as_slice())
            .into_iter()
            .map(|p| Point2::new(p.x as f64, p.y as f64))
            .collect();
        RotatedRect::enclosing_hull(&hull)
    }
}

fn to_f64(points: &[Point2<i32>]) -> Vec<Point2<f64>> {
    points
        .iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect()
}

/// Binary mask (255 = foreground) of pixels darker than their local mean.
pub fn foreground_mask(gray: &GrayImage, params: &SegmentParams) -> GrayImage {
    let smoothed = if params.blur_sigma > 0.0 {
        imageproc::filter::gaussian_blur_f32(gray, params.blur_sigma)
    } else {
        gray.clone()
    };
    let radius = params.block_radius.max(1);
    let mean = imageproc::filter::box_filter(&smoothed, radius, radius);
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let v = smoothed.get_pixel(x, y)[0] as u16 + params.offset as u16;
        let m = mean.get_pixel(x, y)[0] as u16;
        Luma([if v < m { 255 } else { 0 }])
    })
}

/// External contours of `mask` enclosing strictly more than `min_area_px`.
///
/// Only outer borders without a parent are kept, so holes and anything
/// nested inside another region are ignored.
pub fn segment_mask(mask: &GrayImage, min_area_px: f64) -> Vec<ObjectContour> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| {
            let points = c.points.iter().map(|p| Point2::new(p.x, p.y)).collect();
            ObjectContour::from_points(points)
        })
        .filter(|c| c.area_px > min_area_px)
        .collect()
}

/// Grayscale, smooth, threshold, trace.
#[derive(Clone, Debug, Default)]
pub struct HomogeneousBgSegmenter {
    pub params: SegmentParams,
}

impl HomogeneousBgSegmenter {
    pub fn new(params: SegmentParams) -> Self {
        Self { params }
    }

    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(w = frame.width(), h = frame.height()))
    )]
    pub fn segment(&self, frame: &RgbImage) -> Vec<ObjectContour> {
        let gray = image::imageops::grayscale(frame);
        let mask = foreground_mask(&gray, &self.params);
        let contours = segment_mask(&mask, self.params.min_area_px);
        log::debug!(
            "{} contours above {} px^2",
            contours.len(),
            self.params.min_area_px
        );
        contours
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use image::Rgb;

    fn mask_with_block(side: u32) -> GrayImage {
        GrayImage::from_fn(200, 200, |x, y| {
            let inside = (50..50 + side).contains(&x) && (60..60 + side).contains(&y);
            Luma([if inside { 255 } else { 0 }])
        })
    }

    #[test]
    fn blob_below_threshold_is_dropped() {
        assert!(segment_mask(&mask_with_block(40), 2000.0).is_empty());
    }

    #[test]
    fn blob_above_threshold_is_kept_once() {
        let contours = segment_mask(&mask_with_block(60), 2000.0);
        assert_eq!(contours.len(), 1);
        assert_relative_eq!(contours[0].area_px, 59.0 * 59.0, epsilon = 1e-6);
    }

    #[test]
    fn nested_regions_are_ignored() {
        let mut mask = mask_with_block(100);
        for y in 70..140 {
            for x in 60..130 {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
        for y in 85..125 {
            for x in 75..115 {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
        let contours = segment_mask(&mask, 100.0);
        assert_eq!(contours.len(), 1);
        assert_relative_eq!(contours[0].area_px, 99.0 * 99.0, epsilon = 1e-6);
    }

    #[test]
    fn uniform_frame_has_no_contours() {
        let frame = RgbImage::from_pixel(320, 240, Rgb([180, 180, 180]));
        let seg = HomogeneousBgSegmenter::default();
        assert!(seg.segment(&frame).is_empty());
    }

    #[test]
    fn dark_square_on_light_background_is_found() {
        let frame = RgbImage::from_fn(320, 240, |x, y| {
            if (100..200).contains(&x) && (60..160).contains(&y) {
                Rgb([40, 40, 40])
            } else {
                Rgb([220, 220, 220])
            }
        });
        let contours = HomogeneousBgSegmenter::default().segment(&frame);
        assert_eq!(contours.len(), 1);
        let rect = contours[0].min_area_rect().expect("rect");
        assert!((rect.width - 99.0).abs() <= 2.0, "{rect:?}");
        assert!((rect.height - 99.0).abs() <= 2.0, "{rect:?}");
    }

    #[test]
    fn min_area_rect_of_tilted_rectangle() {
        let (s, c) = 30f64.to_radians().sin_cos();
        let mut points = Vec::new();
        for i in 0..=80 {
            for j in [0, 40] {
                let (u, v) = (i as f64, j as f64);
                points.push(Point2::new(
                    (100.0 + c * u - s * v).round() as i32,
                    (100.0 + s * u + c * v).round() as i32,
                ));
            }
        }
        let contour = ObjectContour::from_points(points);
        let rect = contour.min_area_rect().expect("rect");
        assert!((rect.width.max(rect.height) - 80.0).abs() < 1.5, "{rect:?}");
        assert!((rect.width.min(rect.height) - 40.0).abs() < 1.5, "{rect:?}");
    }
}
