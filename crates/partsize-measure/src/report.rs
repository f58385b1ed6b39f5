//! Physical dimensions of segmented objects.

use nalgebra::Point2;
use partsize_core::RotatedRect;
use serde::Serialize;

use crate::{CalibrationRatio, ObjectContour};

/// Physical size of one contour.
///
/// Values are full precision; [`Measurement::width_label`] and
/// [`Measurement::height_label`] round for display.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Measurement {
    /// Index into the contour list this measurement was derived from.
    pub contour_index: usize,
    pub width_cm: f64,
    pub height_cm: f64,
    /// Center of the enclosing rectangle in pixels.
    pub center: Point2<f64>,
    pub angle_deg: f64,
    /// Enclosing rectangle in pixels.
    pub rect: RotatedRect,
}

impl Measurement {
    pub fn width_label(&self) -> String {
        format!("Width {:.1} cm", self.width_cm)
    }

    pub fn height_label(&self) -> String {
        format!("Height {:.1} cm", self.height_cm)
    }
}

/// Measure every contour; no ratio means no measurements.
pub fn report(contours: &[ObjectContour], ratio: Option<CalibrationRatio>) -> Vec<Measurement> {
    let Some(ratio) = ratio else {
        log::debug!("no calibration, skipping {} contours", contours.len());
        return Vec::new();
    };
    contours
        .iter()
        .enumerate()
        .filter_map(|(contour_index, contour)| {
            let rect = contour.min_area_rect()?;
            Some(Measurement {
                contour_index,
                width_cm: ratio.to_cm(rect.width),
                height_cm: ratio.to_cm(rect.height),
                center: rect.center,
                angle_deg: rect.angle_deg,
                rect,
            })
        })
        .collect()
}

/// Minimum-area rectangle reporter with image annotation.
#[derive(Clone, Debug, Default)]
pub struct DimensionReporter {
    pub style: crate::AnnotationStyle,
}

impl DimensionReporter {
    pub fn new(style: crate::AnnotationStyle) -> Self {
        Self { style }
    }
}
