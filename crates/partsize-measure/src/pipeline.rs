//! Per-frame measurement pipeline.

use image::RgbImage;
use partsize_aruco::{Dictionary, MarkerDetection};
use partsize_core::point_in_convex_polygon;
use serde::Serialize;

use crate::{
    CalibrationRatio, Calibrator, DimensionReporter, HomogeneousBgSegmenter, Locator,
    MarkerLocator, MeasureParams, Measurement, ObjectContour, PerimeterCalibrator, Reporter,
    Segmenter,
};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Non-fatal conditions met while measuring one frame.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FrameIssue {
    /// No marker was recognized; dimensions are omitted.
    MarkerNotFound,
    /// The marker could not produce a scale; dimensions are omitted.
    DegenerateMarker { reason: String },
    /// Segmentation found nothing above the area threshold.
    NoForegroundObjects,
}

/// Everything computed for one frame.
#[derive(Clone, Debug, Serialize)]
pub struct FrameMeasurement {
    pub marker: Option<MarkerDetection>,
    pub ratio: Option<CalibrationRatio>,
    #[serde(skip)]
    pub contours: Vec<ObjectContour>,
    pub measurements: Vec<Measurement>,
    pub issues: Vec<FrameIssue>,
}

impl FrameMeasurement {
    /// True when the frame produced physical dimensions.
    pub fn is_calibrated(&self) -> bool {
        self.ratio.is_some()
    }
}

/// A [`FrameMeasurement`] with its annotated image.
#[derive(Clone, Debug)]
pub struct ProcessedFrame {
    pub measurement: FrameMeasurement,
    pub annotated: RgbImage,
}

/// Locate, calibrate, segment and report, one frame at a time.
///
/// The pipeline holds configuration only; frames never influence each other.
#[derive(Clone, Debug)]
pub struct Pipeline<
    L = MarkerLocator,
    C = PerimeterCalibrator,
    S = HomogeneousBgSegmenter,
    R = DimensionReporter,
> {
    locator: L,
    calibrator: C,
    segmenter: S,
    reporter: R,
    exclude_marker: bool,
}

impl Pipeline {
    /// Default parts configured from `params`.
    pub fn new(params: &MeasureParams, dictionary: Dictionary) -> Self {
        Self::from_parts(
            MarkerLocator::new(dictionary, params.detector.clone()),
            PerimeterCalibrator::new(params.marker.real_perimeter_cm()),
            HomogeneousBgSegmenter::new(params.segment.clone()),
            DimensionReporter::new(params.annotate.clone()),
        )
        .with_exclude_marker(params.exclude_marker)
    }
}

impl<L, C, S, R> Pipeline<L, C, S, R>
where
    L: Locator,
    C: Calibrator,
    S: Segmenter,
    R: Reporter,
{
    pub fn from_parts(locator: L, calibrator: C, segmenter: S, reporter: R) -> Self {
        Self {
            locator,
            calibrator,
            segmenter,
            reporter,
            exclude_marker: false,
        }
    }

    /// Drop contours whose centroid lies inside the detected marker.
    pub fn with_exclude_marker(mut self, exclude: bool) -> Self {
        self.exclude_marker = exclude;
        self
    }

    /// Measure one frame without drawing anything.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(w = frame.width(), h = frame.height()))
    )]
    pub fn measure(&self, frame: &RgbImage) -> FrameMeasurement {
        let mut issues = Vec::new();

        let marker = self.locator.locate(frame);
        let ratio = match &marker {
            None => {
                log::info!("no marker found; dimensions omitted");
                issues.push(FrameIssue::MarkerNotFound);
                None
            }
            Some(m) => match self.calibrator.calibrate(&m.corners) {
                Ok(ratio) => Some(ratio),
                Err(err) => {
                    log::warn!("marker {} unusable for calibration: {err}", m.id);
                    issues.push(FrameIssue::DegenerateMarker {
                        reason: err.to_string(),
                    });
                    None
                }
            },
        };

        let mut contours = self.segmenter.segment(frame);
        if self.exclude_marker {
            if let Some(m) = &marker {
                let quad = m.corners_f64();
                contours.retain(|c| {
                    c.centroid()
                        .map_or(true, |p| !point_in_convex_polygon(p, &quad))
                });
            }
        }
        if contours.is_empty() {
            issues.push(FrameIssue::NoForegroundObjects);
        }

        let measurements = self.reporter.report(&contours, ratio);
        log::debug!(
            "{} contours, {} measurements",
            contours.len(),
            measurements.len()
        );

        FrameMeasurement {
            marker,
            ratio,
            contours,
            measurements,
            issues,
        }
    }

    /// Measure one frame and draw the overlay on a copy of it.
    pub fn process(&self, frame: &RgbImage) -> ProcessedFrame {
        let measurement = self.measure(frame);
        let annotated = self.reporter.annotate(
            frame,
            measurement.marker.as_ref(),
            &measurement.contours,
            &measurement.measurements,
        );
        ProcessedFrame {
            measurement,
            annotated,
        }
    }
}
