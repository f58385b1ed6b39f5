#![allow(dead_code)]

use image::{Rgb, RgbImage};
use nalgebra::Point2;
use partsize::aruco::builtins;
use partsize::core::Homography;
use partsize::print::render_marker;

/// Pixels per marker cell in [`scene`]; the marker's black square is 7 cells.
pub const CELL_PX: usize = 20;

/// 800x600 white frame: marker id 0 of the default dictionary at (40, 40)
/// and a dark 278x139 px rectangle at (300, 200).
pub fn scene() -> RgbImage {
    let mut frame = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
    // Quiet zone of one cell, so the black square starts at 20 + 20.
    paste_marker(&mut frame, 20, 20);
    for y in 200..339 {
        for x in 300..578 {
            frame.put_pixel(x, y, Rgb([40, 40, 40]));
        }
    }
    frame
}

/// Black square of the marker in [`centered_marker_scene`], clockwise from
/// top-left, in pixel-edge coordinates.
pub const CENTERED_SQUARE: [(f32, f32); 4] =
    [(330.0, 230.0), (470.0, 230.0), (470.0, 370.0), (330.0, 370.0)];

/// 800x600 white frame with marker id 0 centered on (400, 300).
pub fn centered_marker_scene() -> RgbImage {
    let mut frame = RgbImage::from_pixel(800, 600, Rgb([255, 255, 255]));
    paste_marker(&mut frame, 310, 210);
    frame
}

fn paste_marker(frame: &mut RgbImage, x0: u32, y0: u32) {
    let dict = builtins::default_dictionary();
    let marker = render_marker(&dict, 0, CELL_PX, 1, 1).expect("render marker");
    for y in 0..marker.height {
        for x in 0..marker.width {
            let v = marker.data[y * marker.width + x];
            frame.put_pixel(x0 + x as u32, y0 + y as u32, Rgb([v, v, v]));
        }
    }
}

/// Resample `src` through `h` (source to destination) with bilinear
/// interpolation. Pixels mapping outside the source are white.
pub fn warp_frame(src: &RgbImage, h: &Homography) -> RgbImage {
    let inv = h.inverse().expect("invertible warp");
    let (w, ht) = src.dimensions();
    let luma = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= w as i64 || y >= ht as i64 {
            255.0
        } else {
            src.get_pixel(x as u32, y as u32)[0] as f32
        }
    };
    RgbImage::from_fn(w, ht, |x, y| {
        let p = inv.apply(Point2::new(x as f32 + 0.5, y as f32 + 0.5));
        let (sx, sy) = (p.x - 0.5, p.y - 0.5);
        let (x0, y0) = (sx.floor(), sy.floor());
        let (fx, fy) = (sx - x0, sy - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);
        let top = luma(x0, y0) * (1.0 - fx) + luma(x0 + 1, y0) * fx;
        let bottom = luma(x0, y0 + 1) * (1.0 - fx) + luma(x0 + 1, y0 + 1) * fx;
        let v = (top * (1.0 - fy) + bottom * fy).round().clamp(0.0, 255.0) as u8;
        Rgb([v, v, v])
    })
}
