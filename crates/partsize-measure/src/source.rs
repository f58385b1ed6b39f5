//! Frame acquisition seam. The measurement code never opens devices; callers
//! hand frames in through a [`FrameSource`].

use std::collections::VecDeque;
use std::path::PathBuf;

use image::RgbImage;

use crate::{load_frame, FrameError};

/// Produces frames until exhausted.
pub trait FrameSource {
    /// Next frame with a label for reports, or `None` at the end.
    ///
    /// A frame that fails to decode is returned as an error; the source
    /// stays usable for the following frames.
    fn next_frame(&mut self) -> Option<(String, Result<RgbImage, FrameError>)>;
}

/// Frames read from a list of image files, in order.
#[derive(Clone, Debug, Default)]
pub struct FileFrameSource {
    paths: VecDeque<PathBuf>,
}

impl FileFrameSource {
    pub fn new(paths: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.paths.len()
    }
}

impl FrameSource for FileFrameSource {
    fn next_frame(&mut self) -> Option<(String, Result<RgbImage, FrameError>)> {
        let path = self.paths.pop_front()?;
        let label = path.display().to_string();
        Some((label, load_frame(&path)))
    }
}

impl Iterator for FileFrameSource {
    type Item = (String, Result<RgbImage, FrameError>);

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save_frame;
    use image::Rgb;

    #[test]
    fn bad_file_does_not_stop_the_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let good = dir.path().join("good.png");
        let bad = dir.path().join("bad.png");
        save_frame(&RgbImage::from_pixel(8, 8, Rgb([1, 2, 3])), &good).expect("save");
        std::fs::write(&bad, b"nope").expect("write");

        let mut source = FileFrameSource::new([bad.clone(), good.clone()]);
        assert_eq!(source.remaining(), 2);

        let (label, first) = source.next_frame().expect("first");
        assert!(label.ends_with("bad.png"));
        assert!(matches!(first, Err(FrameError::Decode(_))));

        let (_, second) = source.next_frame().expect("second");
        assert_eq!(second.expect("decoded").dimensions(), (8, 8));
        assert!(source.next_frame().is_none());
    }
}
