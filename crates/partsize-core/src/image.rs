/// Borrowed 8-bit grayscale image, row-major.
#[derive(Clone, Copy, Debug)]
pub struct GrayImageView<'a> {
    pub width: usize,
    pub height: usize,
    pub data: &'a [u8], // len = width * height
}

impl<'a> GrayImageView<'a> {
    /// Wrap a raw buffer; returns `None` when the length does not match.
    pub fn new(width: usize, height: usize, data: &'a [u8]) -> Option<Self> {
        (width.checked_mul(height)? == data.len()).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Pixel at `(x, y)`, or `None` outside the image.
    #[inline]
    pub fn get(&self, x: i32, y: i32) -> Option<u8> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(self.data[y as usize * self.width + x as usize])
    }

    /// Mean of the 3x3 neighbourhood around `(x, y)`.
    ///
    /// Returns `None` if any of the nine pixels falls outside the image.
    pub fn mean_3x3(&self, x: f32, y: f32) -> Option<u8> {
        let ix = x.floor() as i32;
        let iy = y.floor() as i32;
        let mut sum = 0u32;
        for dy in -1..=1 {
            for dx in -1..=1 {
                sum += self.get(ix + dx, iy + dy)? as u32;
            }
        }
        Some((sum / 9) as u8)
    }
}

/// Owned 8-bit grayscale image, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayImage {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u8>,
}

impl GrayImage {
    /// Image of the given size filled with `value`.
    pub fn filled(width: usize, height: usize, value: u8) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    pub fn view(&self) -> GrayImageView<'_> {
        GrayImageView {
            width: self.width,
            height: self.height,
            data: &self.data,
        }
    }

    /// Fill the axis-aligned block `[x0, x0 + w) x [y0, y0 + h)`, clipped to the image.
    pub fn fill_block(&mut self, x0: usize, y0: usize, w: usize, h: usize, value: u8) {
        let x1 = (x0 + w).min(self.width);
        let y1 = (y0 + h).min(self.height);
        for y in y0.min(y1)..y1 {
            let row = y * self.width;
            self.data[row + x0.min(x1)..row + x1].fill(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_rejects_mismatched_buffer() {
        let data = [0u8; 10];
        assert!(GrayImageView::new(3, 3, &data).is_none());
        assert!(GrayImageView::new(5, 2, &data).is_some());
    }

    #[test]
    fn mean_3x3_needs_full_neighbourhood() {
        let mut img = GrayImage::filled(4, 4, 90);
        img.fill_block(0, 0, 2, 2, 0);
        let view = img.view();
        assert_eq!(view.mean_3x3(0.5, 0.5), None);
        // 4 of 9 pixels are zero: (5 * 90) / 9 = 50.
        assert_eq!(view.mean_3x3(1.5, 1.5), Some(50));
    }

    #[test]
    fn fill_block_clips_to_image() {
        let mut img = GrayImage::filled(3, 2, 255);
        img.fill_block(2, 1, 10, 10, 7);
        assert_eq!(img.data, vec![255, 255, 255, 255, 255, 7]);
    }
}
