//! Marker-calibrated object measurement.
//!
//! Per frame, independently of any other frame:
//! 1. locate a square reference marker ([`MarkerLocator`]),
//! 2. turn its pixel perimeter into pixels per centimeter ([`calibrate`]),
//! 3. segment foreground objects against a homogeneous background
//!    ([`HomogeneousBgSegmenter`]),
//! 4. measure each object's minimum-area rectangle ([`report`]) and draw the
//!    overlay ([`annotate`]).
//!
//! [`Pipeline`] runs the stages through the [`Locator`], [`Calibrator`],
//! [`Segmenter`] and [`Reporter`] traits, so each one can be swapped out.
//! A missing or unusable marker is not an error: segmentation still runs and
//! the frame carries a [`FrameIssue`] instead of dimensions.

mod annotate;
mod calibrate;
mod capabilities;
mod frame;
mod params;
mod pipeline;
mod report;
mod segment;
mod source;

#[cfg(test)]
mod test_utils;

pub use annotate::annotate;
pub use calibrate::{
    calibrate, CalibrationError, CalibrationRatio, PerimeterCalibrator, MIN_MARKER_AREA_PX,
    MIN_MARKER_PERIMETER_PX,
};
pub use capabilities::{Calibrator, Locator, MarkerLocator, Reporter, Segmenter};
pub use frame::{decode_frame, encode_frame, load_frame, save_frame, FrameError};
pub use params::{AnnotationStyle, MarkerSpec, MeasureParams, SegmentParams};
pub use pipeline::{FrameIssue, FrameMeasurement, Pipeline, ProcessedFrame};
pub use report::{report, DimensionReporter, Measurement};
pub use segment::{foreground_mask, segment_mask, HomogeneousBgSegmenter, ObjectContour};
pub use source::{FileFrameSource, FrameSource};

pub use image::ImageFormat;
