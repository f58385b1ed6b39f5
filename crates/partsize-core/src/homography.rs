use nalgebra::{Matrix3, Point2, SMatrix, SVector, Vector3};

/// Planar projective transform, `dst ~ H * src`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography {
    pub h: Matrix3<f64>,
}

impl Homography {
    pub fn new(h: Matrix3<f64>) -> Self {
        Self { h }
    }

    #[inline]
    pub fn apply(&self, p: Point2<f32>) -> Point2<f32> {
        let v = self.h * Vector3::new(p.x as f64, p.y as f64, 1.0);
        let w = v[2];
        Point2::new((v[0] / w) as f32, (v[1] / w) as f32)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.h.try_inverse().map(Self::new)
    }
}

/// Similarity that moves the centroid of `pts` to the origin and scales
/// the mean distance to `sqrt(2)` (Hartley normalization).
fn normalizer(pts: &[Point2<f32>; 4]) -> Matrix3<f64> {
    let cx = pts.iter().map(|p| p.x as f64).sum::<f64>() / 4.0;
    let cy = pts.iter().map(|p| p.y as f64).sum::<f64>() / 4.0;
    let mean_dist = pts
        .iter()
        .map(|p| (p.x as f64 - cx).hypot(p.y as f64 - cy))
        .sum::<f64>()
        / 4.0;
    let s = if mean_dist > 1e-12 {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };
    Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0)
}

fn transform(t: &Matrix3<f64>, p: &Point2<f32>) -> (f64, f64) {
    let v = t * Vector3::new(p.x as f64, p.y as f64, 1.0);
    (v[0], v[1])
}

/// Compute `H` such that `dst ~ H * src` from four correspondences.
///
/// Corner order must be consistent between `src` and `dst`. Returns `None`
/// for degenerate configurations (three collinear points, repeated corners).
pub fn homography_from_4pt(src: &[Point2<f32>; 4], dst: &[Point2<f32>; 4]) -> Option<Homography> {
    let t_src = normalizer(src);
    let t_dst = normalizer(dst);

    // Unknowns h11..h32 with h33 = 1:
    //   h11 x + h12 y + h13 - u h31 x - u h32 y = u
    //   h21 x + h22 y + h23 - v h31 x - v h32 y = v
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();
    for k in 0..4 {
        let (x, y) = transform(&t_src, &src[k]);
        let (u, v) = transform(&t_dst, &dst[k]);
        let (r0, r1) = (2 * k, 2 * k + 1);

        a[(r0, 0)] = x;
        a[(r0, 1)] = y;
        a[(r0, 2)] = 1.0;
        a[(r0, 6)] = -u * x;
        a[(r0, 7)] = -u * y;
        b[r0] = u;

        a[(r1, 3)] = x;
        a[(r1, 4)] = y;
        a[(r1, 5)] = 1.0;
        a[(r1, 6)] = -v * x;
        a[(r1, 7)] = -v * y;
        b[r1] = v;
    }

    let x = a.lu().solve(&b)?;
    let hn = Matrix3::new(x[0], x[1], x[2], x[3], x[4], x[5], x[6], x[7], 1.0);

    // H = T_dst^-1 * Hn * T_src, rescaled so that h33 = 1.
    let h = t_dst.try_inverse()? * hn * t_src;
    let s = h[(2, 2)];
    if !s.is_finite() || s.abs() < 1e-12 {
        return None;
    }
    let h = h / s;
    h.iter().all(|v| v.is_finite()).then_some(Homography::new(h))
}

/// Homography mapping the axis-aligned square `[0, side]^2` onto `quad`.
///
/// `quad[0]` receives `(0, 0)`, then `(side, 0)`, `(side, side)`, `(0, side)`.
/// Quads with (near) zero area are rejected.
pub fn square_to_quad(side: f32, quad: &[Point2<f32>; 4]) -> Option<Homography> {
    let quad_f64 = quad.map(|p| Point2::new(p.x as f64, p.y as f64));
    if crate::signed_area(&quad_f64).abs() < 1e-6 {
        return None;
    }
    let square = [
        Point2::new(0.0, 0.0),
        Point2::new(side, 0.0),
        Point2::new(side, side),
        Point2::new(0.0, side),
    ];
    homography_from_4pt(&square, quad)
}
