//! Printable reference markers.
//!
//! A marker is rendered as black (0) and white (255) cells: the dictionary's
//! inner bits, a black border and a white quiet zone. [`render_for_print`]
//! picks the cell size so that the black outer square measures `side_cm`
//! when the PNG is printed at `dpi`; the DPI is stored in the PNG `pHYs`
//! chunk so print dialogs keep the physical size.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use partsize_aruco::Dictionary;
use partsize_core::GrayImage;
use serde::{Deserialize, Serialize};

const CM_PER_INCH: f64 = 2.54;
const INCH_PER_METER: f64 = 1.0 / 0.0254;

#[derive(thiserror::Error, Debug)]
pub enum PrintError {
    #[error("marker id {id} not in dictionary {dictionary} ({count} markers)")]
    UnknownMarker {
        id: u32,
        dictionary: String,
        count: usize,
    },
    #[error("invalid print size: {0}")]
    InvalidSize(String),
    #[error(transparent)]
    Png(#[from] png::EncodingError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// What to print and how large.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerPrintSpec {
    pub id: u32,
    /// Side of the black outer square on paper.
    pub side_cm: f64,
    pub dpi: u32,
    pub border_bits: usize,
    /// White margin around the marker, in cells.
    pub quiet_zone_bits: usize,
}

impl Default for MarkerPrintSpec {
    fn default() -> Self {
        Self {
            id: 0,
            side_cm: 5.0,
            dpi: 300,
            border_bits: 1,
            quiet_zone_bits: 1,
        }
    }
}

/// A rendered marker with its print geometry.
#[derive(Clone, Debug)]
pub struct PrintedMarker {
    pub image: GrayImage,
    pub dpi: u32,
    /// Pixels per cell.
    pub bit_px: usize,
    /// Pixels across the black outer square.
    pub side_px: usize,
}

impl PrintedMarker {
    /// Physical side of the black square at the stored DPI.
    pub fn side_cm(&self) -> f64 {
        self.side_px as f64 / self.dpi as f64 * CM_PER_INCH
    }

    pub fn encode_png(&self) -> Result<Vec<u8>, PrintError> {
        let mut out = Vec::new();
        encode_png(&self.image, Some(self.dpi), &mut out)?;
        Ok(out)
    }

    pub fn write_png(&self, path: impl AsRef<Path>) -> Result<(), PrintError> {
        write_png(&self.image, Some(self.dpi), path)
    }
}

/// Render marker `id` with `bit_px` pixels per cell.
pub fn render_marker(
    dict: &Dictionary,
    id: u32,
    bit_px: usize,
    border_bits: usize,
    quiet_zone_bits: usize,
) -> Result<GrayImage, PrintError> {
    let code = dict.code(id).ok_or_else(|| PrintError::UnknownMarker {
        id,
        dictionary: dict.name.clone(),
        count: dict.len(),
    })?;
    if bit_px == 0 {
        return Err(PrintError::InvalidSize("cell size must be at least 1 px".into()));
    }

    let bits = dict.marker_size;
    let cells = bits + 2 * border_bits;
    let total = (cells + 2 * quiet_zone_bits) * bit_px;
    let mut img = GrayImage::filled(total, total, 255);

    let origin = quiet_zone_bits * bit_px;
    for cy in 0..cells {
        for cx in 0..cells {
            let inner = (border_bits..border_bits + bits).contains(&cx)
                && (border_bits..border_bits + bits).contains(&cy);
            let black = !inner || {
                let idx = (cy - border_bits) * bits + (cx - border_bits);
                (code >> idx) & 1 == 1
            };
            if black {
                img.fill_block(
                    origin + cx * bit_px,
                    origin + cy * bit_px,
                    bit_px,
                    bit_px,
                    0,
                );
            }
        }
    }
    Ok(img)
}

/// Render a marker sized for printing.
pub fn render_for_print(
    dict: &Dictionary,
    spec: &MarkerPrintSpec,
) -> Result<PrintedMarker, PrintError> {
    if !spec.side_cm.is_finite() || spec.side_cm <= 0.0 || spec.dpi == 0 {
        return Err(PrintError::InvalidSize(format!(
            "side {} cm at {} dpi",
            spec.side_cm, spec.dpi
        )));
    }
    let cells = dict.marker_size + 2 * spec.border_bits;
    let side_px_exact = spec.side_cm / CM_PER_INCH * spec.dpi as f64;
    let bit_px = (side_px_exact / cells as f64).round() as usize;
    if bit_px == 0 {
        return Err(PrintError::InvalidSize(format!(
            "{} cm at {} dpi is smaller than one pixel per cell",
            spec.side_cm, spec.dpi
        )));
    }

    let image = render_marker(
        dict,
        spec.id,
        bit_px,
        spec.border_bits,
        spec.quiet_zone_bits,
    )?;
    let side_px = bit_px * cells;
    log::debug!(
        "marker {} of {}: {} px/cell, {:.3} cm printed",
        spec.id,
        dict.name,
        bit_px,
        side_px as f64 / spec.dpi as f64 * CM_PER_INCH
    );
    Ok(PrintedMarker {
        image,
        dpi: spec.dpi,
        bit_px,
        side_px,
    })
}

/// Encode an 8-bit grayscale PNG, optionally tagging its resolution.
pub fn encode_png<W: Write>(img: &GrayImage, dpi: Option<u32>, out: W) -> Result<(), PrintError> {
    let mut encoder = png::Encoder::new(out, img.width as u32, img.height as u32);
    encoder.set_color(png::ColorType::Grayscale);
    encoder.set_depth(png::BitDepth::Eight);
    if let Some(dpi) = dpi {
        let ppm = (dpi as f64 * INCH_PER_METER).round() as u32;
        encoder.set_pixel_dims(Some(png::PixelDimensions {
            xppu: ppm,
            yppu: ppm,
            unit: png::Unit::Meter,
        }));
    }
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&img.data)?;
    writer.finish()?;
    Ok(())
}

pub fn write_png(
    img: &GrayImage,
    dpi: Option<u32>,
    path: impl AsRef<Path>,
) -> Result<(), PrintError> {
    let file = File::create(path)?;
    let mut out = BufWriter::new(file);
    encode_png(img, dpi, &mut out)?;
    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use partsize_aruco::{builtins, MarkerDetector, MarkerDetectorParams};

    #[test]
    fn print_size_matches_requested_side() {
        let dict = builtins::default_dictionary();
        let printed = render_for_print(&dict, &MarkerPrintSpec::default()).expect("render");
        // 5 cm at 300 dpi = 590.55 px over 7 cells.
        assert_eq!(printed.bit_px, 84);
        assert_eq!(printed.side_px, 588);
        assert_eq!(printed.image.width, 588 + 2 * 84);
        assert!((printed.side_cm() - 5.0).abs() < 0.05);
    }

    #[test]
    fn layout_has_quiet_zone_and_border() {
        let dict = builtins::default_dictionary();
        let img = render_marker(&dict, 3, 10, 1, 2).expect("render");
        assert_eq!((img.width, img.height), (110, 110));
        let v = img.view();
        assert_eq!(v.get(5, 5), Some(255), "quiet zone");
        assert_eq!(v.get(25, 25), Some(0), "border");
        assert_eq!(v.get(84, 50), Some(0), "border");
    }

    #[test]
    fn unknown_id_and_zero_size_are_rejected() {
        let dict = builtins::default_dictionary();
        assert!(matches!(
            render_marker(&dict, 50, 10, 1, 1),
            Err(PrintError::UnknownMarker { id: 50, .. })
        ));
        let tiny = MarkerPrintSpec {
            side_cm: 0.01,
            dpi: 72,
            ..MarkerPrintSpec::default()
        };
        assert!(matches!(
            render_for_print(&dict, &tiny),
            Err(PrintError::InvalidSize(_))
        ));
    }

    #[test]
    fn printed_marker_is_detected() {
        let dict = builtins::default_dictionary();
        let img = render_marker(&dict, 17, 16, 1, 2).expect("render");
        let img = image::GrayImage::from_raw(img.width as u32, img.height as u32, img.data)
            .expect("buffer");
        let detector = MarkerDetector::new(dict, MarkerDetectorParams::default());
        let found = detector.detect_first(&img).expect("marker");
        assert_eq!(found.id, 17);
        assert_eq!(found.rotation, 0);
    }

    #[test]
    fn png_carries_dpi() {
        let dict = builtins::default_dictionary();
        let printed = render_for_print(&dict, &MarkerPrintSpec::default()).expect("render");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("marker.png");
        printed.write_png(&path).expect("write");

        let decoded = image::open(&path).expect("open").to_luma8();
        assert_eq!(decoded.width() as usize, printed.image.width);
        assert_eq!(decoded.as_raw(), &printed.image.data);

        let bytes = printed.encode_png().expect("encode");
        let needle = b"pHYs";
        let pos = bytes
            .windows(4)
            .position(|w| w == needle)
            .expect("pHYs chunk");
        let ppm = u32::from_be_bytes([
            bytes[pos + 4],
            bytes[pos + 5],
            bytes[pos + 6],
            bytes[pos + 7],
        ]);
        assert_eq!(ppm, 11811);
    }
}
