//! Frame decoding at the input boundary and encoding for export.

use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::{ImageFormat, RgbImage};

#[derive(thiserror::Error, Debug)]
pub enum FrameError {
    #[error("cannot decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("cannot encode image: {0}")]
    Encode(#[source] image::ImageError),
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decode encoded image bytes into 8-bit RGB.
pub fn decode_frame(bytes: &[u8]) -> Result<RgbImage, FrameError> {
    let img = image::load_from_memory(bytes).map_err(FrameError::Decode)?;
    Ok(img.to_rgb8())
}

/// Read and decode an image file into 8-bit RGB.
pub fn load_frame(path: impl AsRef<Path>) -> Result<RgbImage, FrameError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|source| FrameError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    decode_frame(&bytes)
}

/// Encode a frame in memory, e.g. for a download.
pub fn encode_frame(frame: &RgbImage, format: ImageFormat) -> Result<Vec<u8>, FrameError> {
    let mut buf = Cursor::new(Vec::new());
    frame.write_to(&mut buf, format).map_err(FrameError::Encode)?;
    Ok(buf.into_inner())
}

/// Write a frame to disk; the format follows the file extension.
pub fn save_frame(frame: &RgbImage, path: impl AsRef<Path>) -> Result<(), FrameError> {
    let path = path.as_ref();
    let format = ImageFormat::from_path(path).map_err(FrameError::Encode)?;
    let bytes = encode_frame(frame, format)?;
    std::fs::write(path, bytes).map_err(|source| FrameError::Io {
        path: path.to_path_buf(),
        source,
    })
}
