//! End-to-end helpers: encoded frames in, reports and annotated images out.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::io::FrameReport;
use crate::measure::{
    decode_frame, load_frame, save_frame, Calibrator, FrameError, FrameSource, Locator, Pipeline,
    ProcessedFrame, Reporter, Segmenter,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Decode `bytes` (PNG, JPEG, ...) and run the full pipeline on the frame.
pub fn measure_bytes<L, C, S, R>(
    pipeline: &Pipeline<L, C, S, R>,
    bytes: &[u8],
) -> Result<ProcessedFrame, FrameError>
where
    L: Locator,
    C: Calibrator,
    S: Segmenter,
    R: Reporter,
{
    let frame = decode_frame(bytes)?;
    Ok(pipeline.process(&frame))
}

/// Load an image file and run the full pipeline on it.
pub fn measure_file<L, C, S, R>(
    pipeline: &Pipeline<L, C, S, R>,
    path: impl AsRef<Path>,
) -> Result<ProcessedFrame, FrameError>
where
    L: Locator,
    C: Calibrator,
    S: Segmenter,
    R: Reporter,
{
    let frame = load_frame(path)?;
    Ok(pipeline.process(&frame))
}

/// Output path of the annotated image for `source`: `<stem>_measured.png`.
pub fn annotated_path(out_dir: &Path, source: &str) -> PathBuf {
    out_dir.join(format!("{}_measured.png", source_stem(source)))
}

fn source_stem(source: &str) -> &str {
    Path::new(source)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or("frame")
}

/// Hands out annotated output paths that are unique within one run.
///
/// The first frame with a given stem gets `<stem>_measured.png`; later ones
/// get `<stem>_1_measured.png`, `<stem>_2_measured.png` and so on.
#[derive(Debug, Default)]
pub struct AnnotatedPaths {
    used: HashSet<PathBuf>,
}

impl AnnotatedPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, out_dir: &Path, source: &str) -> PathBuf {
        let mut path = annotated_path(out_dir, source);
        let stem = source_stem(source);
        let mut n = 0usize;
        while self.used.contains(&path) {
            n += 1;
            path = out_dir.join(format!("{stem}_{n}_measured.png"));
        }
        self.used.insert(path.clone());
        path
    }
}

/// Drain `source`, measuring every frame independently.
///
/// Frames that fail to decode get a report carrying the error and the loop
/// moves on. With `out_dir` set, each annotated frame is written there as PNG
/// under a name from [`AnnotatedPaths`], so inputs sharing a file stem do not
/// overwrite each other.
#[cfg_attr(feature = "tracing", instrument(level = "info", skip_all))]
pub fn process_source<F, L, C, S, R>(
    pipeline: &Pipeline<L, C, S, R>,
    source: &mut F,
    out_dir: Option<&Path>,
) -> Vec<FrameReport>
where
    F: FrameSource,
    L: Locator,
    C: Calibrator,
    S: Segmenter,
    R: Reporter,
{
    let mut reports = Vec::new();
    let mut paths = AnnotatedPaths::new();
    while let Some((name, frame)) = source.next_frame() {
        let frame = match frame {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("{name}: {err}");
                reports.push(FrameReport::failed(name, &err));
                continue;
            }
        };

        let processed = pipeline.process(&frame);
        let mut report = FrameReport::from_processed(name.as_str(), &processed);
        log::info!(
            "{name}: {} object(s), {}",
            processed.measurement.contours.len(),
            match report.px_per_cm {
                Some(r) => format!("{r:.2} px/cm"),
                None => "uncalibrated".to_string(),
            }
        );

        if let Some(dir) = out_dir {
            let path = paths.claim(dir, &name);
            match save_frame(&processed.annotated, &path) {
                Ok(()) => report.annotated_path = Some(path.display().to_string()),
                Err(err) => {
                    log::warn!("{name}: {err}");
                    report.error = Some(err.to_string());
                }
            }
        }
        reports.push(report);
    }
    reports
}
