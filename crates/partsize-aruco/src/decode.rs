//! Bit-grid decoding inside one candidate quad.

use crate::{Match, Matcher};
use image::GrayImage as ImageGray;
use nalgebra::Point2;
use partsize_core::{square_to_quad, GrayImageView, Homography};
use serde::{Deserialize, Serialize};

/// Decoder configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeParams {
    /// Marker border width in cells (1 for standard markers).
    pub border_bits: usize,
    /// Require border-black ratio >= this.
    pub min_border_score: f32,
    /// Bit errors accepted when matching; clamped to the dictionary's budget.
    pub max_hamming: u8,
    /// Also accept white-on-black markers.
    pub detect_inverted: bool,
}

impl Default for DecodeParams {
    fn default() -> Self {
        Self {
            border_bits: 1,
            min_border_score: 0.85,
            max_hamming: 3,
            detect_inverted: false,
        }
    }
}

/// One decoded marker.
#[derive(Clone, Debug, Serialize)]
pub struct MarkerDetection {
    pub id: u32,
    /// Image corners clockwise from the marker's own top-left corner.
    pub corners: [Point2<f32>; 4],
    /// Quarter turns between the marker's top-left and the image-ordered quad.
    pub rotation: u8,
    pub hamming: u8,
    /// `border_score * (1 - hamming / bits)`, in `[0, 1]`.
    pub score: f32,
    pub border_score: f32,
    /// Observed inner bits (row-major, black=1).
    pub code: u64,
    /// Whether the marker was read with inverted polarity.
    pub inverted: bool,
}

impl MarkerDetection {
    /// Closed perimeter of the corner polygon in pixels.
    pub fn perimeter_px(&self) -> f64 {
        let pts = self.corners_f64();
        partsize_core::polygon_perimeter(&pts)
    }

    pub fn corners_f64(&self) -> [Point2<f64>; 4] {
        self.corners.map(|p| Point2::new(p.x as f64, p.y as f64))
    }
}

#[derive(Clone, Copy, Debug)]
struct Observation {
    code: u64,
    border_score: f32,
    inverted: bool,
}

/// Sub-samples per cell side used to pick the black/white threshold.
const THRESHOLD_SUBSAMPLES: usize = 3;

/// Decode the marker inside `quad` (image corners in clockwise order).
///
/// The quad is mapped onto a `cells x cells` square, cell centers are
/// sampled with a 3x3 mean and binarized with an Otsu level computed over a
/// denser sub-grid. Returns `None` when the quad is degenerate, leaves the
/// image, has a uniform interior, fails the border check or matches no code.
pub fn decode_quad(
    image: &GrayImageView<'_>,
    quad: &[Point2<f32>; 4],
    params: &DecodeParams,
    matcher: &Matcher,
) -> Option<MarkerDetection> {
    let bits = matcher.marker_size();
    let cells = bits + 2 * params.border_bits;
    if bits == 0 || bits * bits > 64 {
        return None;
    }
    let h = square_to_quad(cells as f32, quad)?;

    let samples = sample_cells(image, &h, cells)?;
    let thr_samples = sample_threshold_grid(image, &h, cells);
    let level = otsu_level(&thr_samples)?;

    let obs = read_bits(&samples, level, cells, bits, params)?;
    let m = matcher.match_code(obs.code)?;
    Some(build_detection(quad, obs, m, bits))
}

fn sample_cells(image: &GrayImageView<'_>, h: &Homography, cells: usize) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(cells * cells);
    for cy in 0..cells {
        for cx in 0..cells {
            let q = h.apply(Point2::new(cx as f32 + 0.5, cy as f32 + 0.5));
            out.push(image.mean_3x3(q.x, q.y)?);
        }
    }
    Some(out)
}

fn sample_threshold_grid(image: &GrayImageView<'_>, h: &Homography, cells: usize) -> Vec<u8> {
    let n = cells * THRESHOLD_SUBSAMPLES;
    let step = 1.0 / THRESHOLD_SUBSAMPLES as f32;
    (0..n)
        .flat_map(|j| (0..n).map(move |i| (i, j)))
        .filter_map(|(i, j)| {
            let p = Point2::new((i as f32 + 0.5) * step, (j as f32 + 0.5) * step);
            let q = h.apply(p);
            image.mean_3x3(q.x, q.y)
        })
        .collect()
}

/// Otsu level over raw samples; `None` when the samples carry no contrast.
fn otsu_level(samples: &[u8]) -> Option<u8> {
    let (min, max) = samples
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if samples.is_empty() || min == max {
        return None;
    }
    let row = ImageGray::from_raw(samples.len() as u32, 1, samples.to_vec())?;
    Some(imageproc::contrast::otsu_level(&row))
}

fn read_bits(
    samples: &[u8],
    level: u8,
    cells: usize,
    bits: usize,
    params: &DecodeParams,
) -> Option<Observation> {
    let border = params.border_bits;
    let polarities: &[bool] = if params.detect_inverted {
        &[false, true]
    } else {
        &[false]
    };

    let mut best: Option<Observation> = None;
    for &inverted in polarities {
        let mut border_ok = 0u32;
        let mut border_total = 0u32;
        let mut code = 0u64;

        for cy in 0..cells {
            for cx in 0..cells {
                let is_black = (samples[cy * cells + cx] <= level) != inverted;
                let is_border = cx < border
                    || cy < border
                    || cx + border >= cells
                    || cy + border >= cells;
                if is_border {
                    border_total += 1;
                    border_ok += u32::from(is_black);
                } else if is_black {
                    code |= 1u64 << ((cy - border) * bits + (cx - border));
                }
            }
        }

        let border_score = if border_total > 0 {
            border_ok as f32 / border_total as f32
        } else {
            1.0
        };
        if border_score < params.min_border_score {
            continue;
        }
        if best.map_or(true, |b| border_score > b.border_score) {
            best = Some(Observation {
                code,
                border_score,
                inverted,
            });
        }
    }
    best
}

fn build_detection(
    quad: &[Point2<f32>; 4],
    obs: Observation,
    m: Match,
    bits: usize,
) -> MarkerDetection {
    let ham_pen = 1.0 - (m.hamming as f32 / (bits * bits).max(1) as f32);
    let score = (obs.border_score * ham_pen).clamp(0.0, 1.0);

    // observed == rotate(dict, r): the marker's own corner k sits at quad[(k + r) % 4].
    let r = m.rotation as usize;
    let corners = [0usize, 1, 2, 3].map(|k| quad[(k + r) % 4]);

    MarkerDetection {
        id: m.id,
        corners,
        rotation: m.rotation,
        hamming: m.hamming,
        score,
        border_score: obs.border_score,
        code: obs.code,
        inverted: obs.inverted,
    }
}

#[cfg(test)]
pub(crate) mod test_utils {
    use partsize_core::GrayImage;

    /// Paint a marker (black = 0, white = 255) with `border` black cells
    /// around `code` at `(x0, y0)` on `img`.
    pub fn paint_marker(
        img: &mut GrayImage,
        code: u64,
        bits: usize,
        border: usize,
        cell_px: usize,
        x0: usize,
        y0: usize,
    ) {
        let cells = bits + 2 * border;
        for cy in 0..cells {
            for cx in 0..cells {
                let inner = (border..border + bits).contains(&cx)
                    && (border..border + bits).contains(&cy);
                let black = if inner {
                    let idx = (cy - border) * bits + (cx - border);
                    (code >> idx) & 1 == 1
                } else {
                    true
                };
                let v = if black { 0 } else { 255 };
                img.fill_block(x0 + cx * cell_px, y0 + cy * cell_px, cell_px, cell_px, v);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_utils::paint_marker;
    use super::*;
    use crate::{builtins, rotate_code};
    use partsize_core::GrayImage;

    const CELL: usize = 20;

    fn marker_quad(x0: f32, side: f32) -> [Point2<f32>; 4] {
        [
            Point2::new(x0, x0),
            Point2::new(x0 + side, x0),
            Point2::new(x0 + side, x0 + side),
            Point2::new(x0, x0 + side),
        ]
    }

    #[test]
    fn decodes_axis_aligned_marker() {
        let dict = builtins::default_dictionary();
        let matcher = Matcher::new(&dict, 3);
        let mut img = GrayImage::filled(200, 200, 255);
        paint_marker(&mut img, dict.codes[5], 5, 1, CELL, 30, 30);

        let quad = marker_quad(30.0, 7.0 * CELL as f32);
        let det = decode_quad(&img.view(), &quad, &DecodeParams::default(), &matcher)
            .expect("decoded");
        assert_eq!(det.id, 5);
        assert_eq!(det.rotation, 0);
        assert_eq!(det.hamming, 0);
        assert!(det.score > 0.99);
        assert_eq!(det.corners, quad);
    }

    #[test]
    fn rotated_code_reorders_corners() {
        let dict = builtins::default_dictionary();
        let matcher = Matcher::new(&dict, 0);
        let mut img = GrayImage::filled(200, 200, 255);
        // What the camera sees when the marker is turned a quarter turn clockwise.
        paint_marker(&mut img, rotate_code(dict.codes[2], 5, 1), 5, 1, CELL, 30, 30);

        let quad = marker_quad(30.0, 7.0 * CELL as f32);
        let det = decode_quad(&img.view(), &quad, &DecodeParams::default(), &matcher)
            .expect("decoded");
        assert_eq!((det.id, det.rotation), (2, 1));
        assert_eq!(det.corners[0], quad[1]);
        assert_eq!(det.corners[3], quad[0]);
    }

    #[test]
    fn uniform_quad_is_not_a_marker() {
        let dict = builtins::default_dictionary();
        let matcher = Matcher::new(&dict, 3);
        let img = GrayImage::filled(200, 200, 40);
        let quad = marker_quad(30.0, 140.0);
        assert!(decode_quad(&img.view(), &quad, &DecodeParams::default(), &matcher).is_none());
    }

    #[test]
    fn inverted_marker_needs_opt_in() {
        let dict = builtins::default_dictionary();
        let matcher = Matcher::new(&dict, 0);
        let mut img = GrayImage::filled(200, 200, 0);
        paint_marker(&mut img, dict.codes[9], 5, 1, CELL, 30, 30);
        for v in img.data.iter_mut() {
            *v = 255 - *v;
        }
        let quad = marker_quad(30.0, 140.0);

        assert!(decode_quad(&img.view(), &quad, &DecodeParams::default(), &matcher).is_none());

        let params = DecodeParams {
            detect_inverted: true,
            ..DecodeParams::default()
        };
        let det = decode_quad(&img.view(), &quad, &params, &matcher).expect("inverted");
        assert_eq!(det.id, 9);
        assert!(det.inverted);
    }
}
