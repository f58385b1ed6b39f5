use image::{Rgb, RgbImage};

/// White frame with one black-bordered marker of `code` (5x5 bits) at `(x0, y0)`.
pub fn marker_frame(
    width: u32,
    height: u32,
    code: u64,
    cell_px: u32,
    x0: u32,
    y0: u32,
) -> RgbImage {
    let bits = 5u32;
    let cells = bits + 2;
    RgbImage::from_fn(width, height, |x, y| {
        if x < x0 || y < y0 || x >= x0 + cells * cell_px || y >= y0 + cells * cell_px {
            return Rgb([255, 255, 255]);
        }
        let (cx, cy) = ((x - x0) / cell_px, (y - y0) / cell_px);
        let inner = (1..=bits).contains(&cx) && (1..=bits).contains(&cy);
        let black = !inner || (code >> ((cy - 1) * bits + (cx - 1))) & 1 == 1;
        if black {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

/// Paint a dark square of side `side` with top-left `(x0, y0)`.
pub fn dark_square(frame: &mut RgbImage, x0: u32, y0: u32, side: u32) {
    for y in y0..y0 + side {
        for x in x0..x0 + side {
            frame.put_pixel(x, y, Rgb([40, 40, 40]));
        }
    }
}
