//! Convex quadrilateral candidates from locally thresholded contours.

use image::{GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType};
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use nalgebra::Point2;
use partsize_core::{drop_collinear_vertices, is_convex, order_clockwise};
use serde::{Deserialize, Serialize};

/// Candidate search configuration.
///
/// Perimeter limits are relative to the larger image side so the same
/// parameters work across resolutions.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadParams {
    /// Box-filter radii for the local mean threshold, one pass per radius.
    pub threshold_radii: Vec<u32>,
    /// A pixel is dark when `pixel + offset < local mean`.
    pub threshold_offset: u8,
    pub min_perimeter_rate: f64,
    pub max_perimeter_rate: f64,
    /// Polygon approximation tolerance relative to the contour perimeter.
    pub polygon_accuracy_rate: f64,
    /// Shortest accepted quad side in pixels.
    pub min_side_px: f64,
}

impl Default for QuadParams {
    fn default() -> Self {
        Self {
            threshold_radii: vec![7, 13],
            threshold_offset: 7,
            min_perimeter_rate: 0.03,
            max_perimeter_rate: 4.0,
            polygon_accuracy_rate: 0.03,
            min_side_px: 8.0,
        }
    }
}

/// Dark-pixel mask (255 = dark) from a box-filtered local mean.
pub(crate) fn local_dark_mask(image: &GrayImage, radius: u32, offset: u8) -> GrayImage {
    let mean = imageproc::filter::box_filter(image, radius, radius);
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let v = image.get_pixel(x, y)[0] as u16 + offset as u16;
        let m = mean.get_pixel(x, y)[0] as u16;
        Luma([if v < m { 255 } else { 0 }])
    })
}

/// Find convex quads whose corners are ordered clockwise starting from the
/// corner nearest the image origin. Near-duplicates across threshold passes
/// are dropped.
pub fn find_quad_candidates(image: &GrayImage, params: &QuadParams) -> Vec<[Point2<f32>; 4]> {
    let max_dim = image.width().max(image.height()) as f64;
    let min_perimeter = params.min_perimeter_rate * max_dim;
    let max_perimeter = params.max_perimeter_rate * max_dim;

    let mut quads: Vec<[Point2<f32>; 4]> = Vec::new();
    for &radius in &params.threshold_radii {
        let mask = local_dark_mask(image, radius.max(1), params.threshold_offset);
        let contours = find_contours::<i32>(&mask);
        log::trace!("radius {radius}: {} contours", contours.len());

        for contour in contours {
            if contour.border_type != BorderType::Outer || contour.points.len() < 4 {
                continue;
            }
            let perimeter = arc_length(&contour.points, true);
            if perimeter < min_perimeter || perimeter > max_perimeter {
                continue;
            }
            let Some(quad) = contour_to_quad(&contour.points, perimeter, params) else {
                continue;
            };
            if !quads.iter().any(|q| is_same_quad(q, &quad)) {
                quads.push(quad);
            }
        }
    }
    quads
}

fn contour_to_quad(
    points: &[Point<i32>],
    perimeter: f64,
    params: &QuadParams,
) -> Option<[Point2<f32>; 4]> {
    let epsilon = (perimeter * params.polygon_accuracy_rate).max(1.0);
    let approx = approximate_polygon_dp(points, epsilon, true);
    let poly: Vec<Point2<f64>> = approx
        .iter()
        .map(|p| Point2::new(p.x as f64, p.y as f64))
        .collect();
    let poly = drop_collinear_vertices(&poly, epsilon);
    if poly.len() != 4 || !is_convex(&poly) {
        return None;
    }
    let shortest = (0..4)
        .map(|i| (poly[(i + 1) % 4] - poly[i]).norm())
        .fold(f64::INFINITY, f64::min);
    if shortest < params.min_side_px {
        return None;
    }
    let quad = [0, 1, 2, 3].map(|i| Point2::new(poly[i].x as f32, poly[i].y as f32));
    Some(order_clockwise(quad))
}

fn is_same_quad(a: &[Point2<f32>; 4], b: &[Point2<f32>; 4]) -> bool {
    let side = (a[1] - a[0]).norm().max((a[2] - a[1]).norm());
    let tol = (0.05 * side).max(2.0);
    a.iter().zip(b).all(|(p, q)| (p - q).norm() <= tol)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_image(x0: u32, side: u32) -> GrayImage {
        GrayImage::from_fn(300, 240, |x, y| {
            let inside = x >= x0 && x < x0 + side && y >= x0 && y < x0 + side;
            Luma([if inside { 20 } else { 235 }])
        })
    }

    #[test]
    fn dark_square_yields_one_quad() {
        let img = square_image(50, 100);
        let quads = find_quad_candidates(&img, &QuadParams::default());
        assert_eq!(quads.len(), 1, "{quads:?}");
        let q = quads[0];
        assert!((q[0].x - 50.0).abs() <= 1.0 && (q[0].y - 50.0).abs() <= 1.0);
        assert!((q[2].x - 149.0).abs() <= 1.0 && (q[2].y - 149.0).abs() <= 1.0);
    }

    #[test]
    fn tiny_blob_is_ignored() {
        let img = square_image(50, 5);
        assert!(find_quad_candidates(&img, &QuadParams::default()).is_empty());
    }

    #[test]
    fn flat_image_has_no_dark_pixels() {
        let img = GrayImage::from_pixel(64, 64, Luma([128]));
        let mask = local_dark_mask(&img, 7, 7);
        assert!(mask.pixels().all(|p| p[0] == 0));
    }
}
