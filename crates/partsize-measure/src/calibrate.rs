//! Pixels-per-centimeter ratio from one marker's perimeter.

use nalgebra::Point2;
use partsize_core::{polygon_area, polygon_perimeter};
use serde::Serialize;

/// Perimeters below this many pixels cannot give a usable scale.
pub const MIN_MARKER_PERIMETER_PX: f64 = 4.0;
/// Marker polygons enclosing less than this many square pixels are collinear.
pub const MIN_MARKER_AREA_PX: f64 = 1.0;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CalibrationError {
    #[error("marker corner {index} is not finite")]
    NonFiniteCorner { index: usize },
    #[error("real marker perimeter must be positive and finite, got {0}")]
    InvalidRealPerimeter(f64),
    #[error("degenerate marker: perimeter {perimeter_px:.3} px, area {area_px:.3} px^2")]
    DegenerateMarker { perimeter_px: f64, area_px: f64 },
}

/// Pixels per centimeter. Always positive and finite.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct CalibrationRatio(f64);

impl CalibrationRatio {
    #[inline]
    pub fn px_per_cm(self) -> f64 {
        self.0
    }

    /// Convert a pixel length to centimeters.
    #[inline]
    pub fn to_cm(self, px: f64) -> f64 {
        px / self.0
    }
}

/// Closed-polygon perimeter of `corners` divided by `real_perimeter_cm`.
pub fn calibrate(
    corners: &[Point2<f32>; 4],
    real_perimeter_cm: f64,
) -> Result<CalibrationRatio, CalibrationError> {
    if let Some(index) = corners
        .iter()
        .position(|p| !p.x.is_finite() || !p.y.is_finite())
    {
        return Err(CalibrationError::NonFiniteCorner { index });
    }
    if !real_perimeter_cm.is_finite() || real_perimeter_cm <= 0.0 {
        return Err(CalibrationError::InvalidRealPerimeter(real_perimeter_cm));
    }

    let pts = corners.map(|p| Point2::new(p.x as f64, p.y as f64));
    let perimeter_px = polygon_perimeter(&pts);
    let area_px = polygon_area(&pts);
    if perimeter_px < MIN_MARKER_PERIMETER_PX || area_px < MIN_MARKER_AREA_PX {
        return Err(CalibrationError::DegenerateMarker {
            perimeter_px,
            area_px,
        });
    }

    let ratio = perimeter_px / real_perimeter_cm;
    log::debug!("marker perimeter {perimeter_px:.2} px -> {ratio:.4} px/cm");
    Ok(CalibrationRatio(ratio))
}

/// Perimeter-based calibrator for a marker of fixed physical size.
#[derive(Clone, Debug)]
pub struct PerimeterCalibrator {
    pub real_perimeter_cm: f64,
}

impl PerimeterCalibrator {
    pub fn new(real_perimeter_cm: f64) -> Self {
        Self { real_perimeter_cm }
    }
}

impl Default for PerimeterCalibrator {
    fn default() -> Self {
        Self::new(20.0)
    }
}
