//! Polygon helpers and the minimum-area enclosing rectangle.
//!
//! Polygons are closed implicitly: the last vertex connects back to the first.
//! Image coordinates are assumed (x to the right, y down), so a positive
//! [`signed_area`] means the vertices run clockwise on screen.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Shoelace area, positive for clockwise-on-screen order.
pub fn signed_area(points: &[Point2<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let n = points.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    0.5 * twice
}

/// Absolute enclosed area.
pub fn polygon_area(points: &[Point2<f64>]) -> f64 {
    signed_area(points).abs()
}

/// Length of the closed boundary.
pub fn polygon_perimeter(points: &[Point2<f64>]) -> f64 {
    match points.len() {
        0 | 1 => 0.0,
        n => (0..n).map(|i| (points[(i + 1) % n] - points[i]).norm()).sum(),
    }
}

/// Vertex average.
pub fn centroid(points: &[Point2<f64>]) -> Option<Point2<f64>> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold(Vector2::zeros(), |acc: Vector2<f64>, p| acc + p.coords);
    Some(Point2::from(sum / n))
}

fn cross(o: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

/// True if the polygon is strictly convex (no zero-length or collinear turns).
pub fn is_convex(points: &[Point2<f64>]) -> bool {
    let n = points.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0_f64;
    for i in 0..n {
        let c = cross(points[i], points[(i + 1) % n], points[(i + 2) % n]);
        if c.abs() < 1e-9 {
            return false;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    true
}

/// Point-in-polygon test for a convex polygon in either orientation.
pub fn point_in_convex_polygon(p: Point2<f64>, polygon: &[Point2<f64>]) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }
    let mut sign = 0.0_f64;
    for i in 0..n {
        let c = cross(polygon[i], polygon[(i + 1) % n], p);
        if c == 0.0 {
            continue;
        }
        if sign == 0.0 {
            sign = c.signum();
        } else if c.signum() != sign {
            return false;
        }
    }
    true
}

/// Reorder four corners clockwise on screen, starting from the corner
/// closest to the image origin (smallest `x + y`).
pub fn order_clockwise(quad: [Point2<f32>; 4]) -> [Point2<f32>; 4] {
    let cx = quad.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = quad.iter().map(|p| p.y).sum::<f32>() / 4.0;

    let mut sorted = quad;
    sorted.sort_by(|a, b| {
        let ta = (a.y - cy).atan2(a.x - cx);
        let tb = (b.y - cy).atan2(b.x - cx);
        ta.total_cmp(&tb)
    });

    let start = (0..4)
        .min_by(|&i, &j| (sorted[i].x + sorted[i].y).total_cmp(&(sorted[j].x + sorted[j].y)))
        .unwrap_or(0);
    [0, 1, 2, 3].map(|k| sorted[(start + k) % 4])
}

/// Remove vertices that lie within `epsilon` of the line through their
/// neighbours, repeating until nothing changes.
///
/// Polygon approximation of a traced boundary can keep the trace's start
/// point as an extra vertex on a straight side; this folds it back.
pub fn drop_collinear_vertices(points: &[Point2<f64>], epsilon: f64) -> Vec<Point2<f64>> {
    let mut out: Vec<Point2<f64>> = points.to_vec();
    while out.len() > 1 && out.first() == out.last() {
        out.pop();
    }

    loop {
        let n = out.len();
        if n <= 3 {
            return out;
        }
        let removable = (0..n).find(|&i| {
            let prev = out[(i + n - 1) % n];
            let next = out[(i + 1) % n];
            let base = (next - prev).norm();
            if base < 1e-12 {
                return true;
            }
            cross(prev, next, out[i]).abs() / base < epsilon
        });
        match removable {
            Some(i) => {
                out.remove(i);
            }
            None => return out,
        }
    }
}

/// Rectangle with arbitrary rotation.
///
/// `width` is measured along the direction `angle_deg` (degrees, in
/// `[0, 90)`, clockwise on screen from the +x axis) and `height` along the
/// perpendicular direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RotatedRect {
    pub center: Point2<f64>,
    pub width: f64,
    pub height: f64,
    pub angle_deg: f64,
}

impl RotatedRect {
    /// Smallest-area rectangle enclosing `points`.
    ///
    /// `hull` must be the convex hull of the shape (any orientation); every
    /// candidate rectangle has one side flush with a hull edge. Returns
    /// `None` for an empty input.
    pub fn enclosing_hull(hull: &[Point2<f64>]) -> Option<Self> {
        match hull.len() {
            0 => return None,
            1 => {
                return Some(Self {
                    center: hull[0],
                    width: 0.0,
                    height: 0.0,
                    angle_deg: 0.0,
                })
            }
            _ => {}
        }

        let n = hull.len();
        let mut best: Option<(f64, Self)> = None;
        for i in 0..n {
            let edge = hull[(i + 1) % n] - hull[i];
            let len = edge.norm();
            if len < 1e-12 {
                continue;
            }
            let u = edge / len;
            let v = Vector2::new(-u.y, u.x);

            let (mut min_u, mut max_u) = (f64::INFINITY, f64::NEG_INFINITY);
            let (mut min_v, mut max_v) = (f64::INFINITY, f64::NEG_INFINITY);
            for p in hull {
                let d = p.coords;
                let pu = d.dot(&u);
                let pv = d.dot(&v);
                min_u = min_u.min(pu);
                max_u = max_u.max(pu);
                min_v = min_v.min(pv);
                max_v = max_v.max(pv);
            }

            let width = max_u - min_u;
            let height = max_v - min_v;
            let area = width * height;
            if best.as_ref().is_some_and(|(a, _)| area >= *a - 1e-9) {
                continue;
            }

            let mid_u = 0.5 * (min_u + max_u);
            let mid_v = 0.5 * (min_v + max_v);
            let center = Point2::from(u * mid_u + v * mid_v);
            let angle = u.y.atan2(u.x).to_degrees();
            best = Some((area, Self::normalized(center, width, height, angle)));
        }

        best.map(|(_, rect)| rect)
    }

    /// Bring `angle` into `[0, 90)`, swapping sides when rotating by 90 degrees.
    fn normalized(center: Point2<f64>, width: f64, height: f64, angle: f64) -> Self {
        let mut angle = angle.rem_euclid(180.0);
        let (mut width, mut height) = (width, height);
        if angle >= 90.0 {
            angle -= 90.0;
            std::mem::swap(&mut width, &mut height);
        }
        if angle >= 90.0 - 1e-9 {
            angle = 0.0;
            std::mem::swap(&mut width, &mut height);
        }
        Self {
            center,
            width,
            height,
            angle_deg: angle,
        }
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Corner points, clockwise on screen.
    pub fn corners(&self) -> [Point2<f64>; 4] {
        let (s, c) = self.angle_deg.to_radians().sin_cos();
        let u = Vector2::new(c, s) * (0.5 * self.width);
        let v = Vector2::new(-s, c) * (0.5 * self.height);
        [
            self.center - u - v,
            self.center + u - v,
            self.center + u + v,
            self.center - u + v,
        ]
    }
}
