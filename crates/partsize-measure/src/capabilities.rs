//! Stage interfaces of the measurement pipeline and their default parts.

use image::RgbImage;
use nalgebra::Point2;
use partsize_aruco::{Dictionary, MarkerDetection, MarkerDetector, MarkerDetectorParams};

use crate::{
    annotate, calibrate, report, CalibrationError, CalibrationRatio, DimensionReporter,
    HomogeneousBgSegmenter, Measurement, ObjectContour, PerimeterCalibrator,
};

/// Finds the reference marker in a frame.
pub trait Locator {
    /// The first recognized marker, or `None` when the frame has none.
    fn locate(&self, frame: &RgbImage) -> Option<MarkerDetection>;
}

/// Turns marker corners into a pixels-per-centimeter ratio.
pub trait Calibrator {
    fn calibrate(&self, corners: &[Point2<f32>; 4]) -> Result<CalibrationRatio, CalibrationError>;
}

/// Splits a frame into foreground object contours.
pub trait Segmenter {
    fn segment(&self, frame: &RgbImage) -> Vec<ObjectContour>;
}

/// Measures contours and draws the overlay.
pub trait Reporter {
    fn report(&self, contours: &[ObjectContour], ratio: Option<CalibrationRatio>)
        -> Vec<Measurement>;

    fn annotate(
        &self,
        frame: &RgbImage,
        marker: Option<&MarkerDetection>,
        contours: &[ObjectContour],
        measurements: &[Measurement],
    ) -> RgbImage;
}

/// [`Locator`] backed by the square-marker detector.
#[derive(Clone, Debug)]
pub struct MarkerLocator {
    detector: MarkerDetector,
}

impl MarkerLocator {
    pub fn new(dictionary: Dictionary, params: MarkerDetectorParams) -> Self {
        Self {
            detector: MarkerDetector::new(dictionary, params),
        }
    }
}

impl Locator for MarkerLocator {
    fn locate(&self, frame: &RgbImage) -> Option<MarkerDetection> {
        let gray = image::imageops::grayscale(frame);
        let found = self.detector.detect(&gray);
        if found.len() > 1 {
            log::debug!(
                "{} {} markers found, using id {}",
                found.len(),
                self.detector.dictionary().name,
                found[0].id
            );
        }
        found.into_iter().next()
    }
}

impl Calibrator for PerimeterCalibrator {
    fn calibrate(&self, corners: &[Point2<f32>; 4]) -> Result<CalibrationRatio, CalibrationError> {
        calibrate(corners, self.real_perimeter_cm)
    }
}

impl Segmenter for HomogeneousBgSegmenter {
    fn segment(&self, frame: &RgbImage) -> Vec<ObjectContour> {
        HomogeneousBgSegmenter::segment(self, frame)
    }
}

impl Reporter for DimensionReporter {
    fn report(
        &self,
        contours: &[ObjectContour],
        ratio: Option<CalibrationRatio>,
    ) -> Vec<Measurement> {
        report(contours, ratio)
    }

    fn annotate(
        &self,
        frame: &RgbImage,
        marker: Option<&MarkerDetection>,
        contours: &[ObjectContour],
        measurements: &[Measurement],
    ) -> RgbImage {
        annotate(frame, marker, contours, measurements, &self.style)
    }
}
