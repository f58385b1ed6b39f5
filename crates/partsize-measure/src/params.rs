use partsize_aruco::MarkerDetectorParams;
use serde::{Deserialize, Serialize};

/// Physical size of the printed reference marker.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerSpec {
    /// Side of the black outer square, in centimeters.
    pub side_cm: f64,
}

impl Default for MarkerSpec {
    fn default() -> Self {
        Self { side_cm: 5.0 }
    }
}

impl MarkerSpec {
    pub fn real_perimeter_cm(&self) -> f64 {
        4.0 * self.side_cm
    }
}

/// Homogeneous-background segmentation settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentParams {
    /// Gaussian sigma applied before thresholding; `<= 0` disables smoothing.
    pub blur_sigma: f32,
    /// Local mean window is `2 * block_radius + 1` pixels wide.
    pub block_radius: u32,
    /// A pixel is foreground when `pixel + offset < local mean`.
    pub offset: u8,
    /// Contours must enclose strictly more than this many square pixels.
    pub min_area_px: f64,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self {
            blur_sigma: 1.0,
            block_radius: 9,
            offset: 5,
            min_area_px: 2000.0,
        }
    }
}

/// Overlay colors (RGB) and label layout.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationStyle {
    pub marker_color: [u8; 3],
    pub marker_thickness: u32,
    pub box_color: [u8; 3],
    pub box_thickness: u32,
    pub centroid_color: [u8; 3],
    pub centroid_radius: i32,
    pub label_color: [u8; 3],
    /// Label glyph height in pixels.
    pub label_scale: f32,
    /// Horizontal offset of labels relative to the centroid.
    pub label_offset_x: i32,
}

impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            marker_color: [0, 255, 0],
            marker_thickness: 5,
            box_color: [0, 0, 255],
            box_thickness: 2,
            centroid_color: [255, 0, 0],
            centroid_radius: 5,
            label_color: [0, 200, 100],
            label_scale: 24.0,
            label_offset_x: -100,
        }
    }
}

/// Everything the measurement pipeline needs besides the dictionary.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureParams {
    pub marker: MarkerSpec,
    pub segment: SegmentParams,
    pub detector: MarkerDetectorParams,
    pub annotate: AnnotationStyle,
    /// Drop contours whose centroid lies inside the detected marker.
    pub exclude_marker: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let params: MeasureParams =
            serde_json::from_str(r#"{"marker":{"side_cm":2.5},"segment":{"min_area_px":500}}"#)
                .expect("parse");
        assert_eq!(params.marker.real_perimeter_cm(), 10.0);
        assert_eq!(params.segment.min_area_px, 500.0);
        assert_eq!(params.segment.block_radius, 9);
        assert!(!params.exclude_marker);
        assert_eq!(params.detector.decode.border_bits, 1);
    }
}
