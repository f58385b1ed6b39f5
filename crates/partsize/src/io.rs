//! JSON configuration and report helpers.

use crate::aruco::{builtins, Dictionary, DictionaryError, MarkerDetection};
use crate::measure::{FrameIssue, MeasureParams, Measurement, Pipeline, ProcessedFrame};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
};

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    Dictionary(#[from] DictionaryError),
    #[error("marker side must be positive and finite, got {0} cm")]
    MarkerSide(f64),
}

/// Where the marker dictionary comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionarySource {
    /// One of [`builtins::builtin_names`].
    Builtin(String),
    /// A dictionary JSON file (see [`Dictionary::load_json`]).
    File(PathBuf),
}

impl Default for DictionarySource {
    fn default() -> Self {
        Self::Builtin(builtins::PARTSIZE_5X5_50.to_string())
    }
}

impl DictionarySource {
    pub fn load(&self) -> Result<Dictionary, DictionaryError> {
        match self {
            Self::Builtin(name) => builtins::require_builtin(name),
            Self::File(path) => Dictionary::load_json(path),
        }
    }
}

/// Measurement configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MeasureConfig {
    pub params: MeasureParams,
    pub dictionary: DictionarySource,
}

impl MeasureConfig {
    /// Load a JSON config from disk; missing fields take their defaults.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, IoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load the dictionary and build the default pipeline.
    pub fn build_pipeline(&self) -> Result<Pipeline, ConfigError> {
        let side = self.params.marker.side_cm;
        if !side.is_finite() || side <= 0.0 {
            return Err(ConfigError::MarkerSide(side));
        }
        let dictionary = self.dictionary.load()?;
        log::info!(
            "dictionary {} ({} markers, {}x{} bits), marker side {side} cm",
            dictionary.name,
            dictionary.len(),
            dictionary.marker_size,
            dictionary.marker_size
        );
        Ok(Pipeline::new(&self.params, dictionary))
    }
}

/// Result for one input frame.
#[derive(Debug, Clone, Serialize)]
pub struct FrameReport {
    pub source: String,
    /// `[width, height]` of the decoded frame.
    pub size: Option<[u32; 2]>,
    pub marker: Option<MarkerDetection>,
    pub px_per_cm: Option<f64>,
    pub measurements: Vec<Measurement>,
    pub issues: Vec<FrameIssue>,
    pub annotated_path: Option<String>,
    pub error: Option<String>,
}

impl FrameReport {
    pub fn from_processed(source: impl Into<String>, frame: &ProcessedFrame) -> Self {
        let m = &frame.measurement;
        Self {
            source: source.into(),
            size: Some([frame.annotated.width(), frame.annotated.height()]),
            marker: m.marker.clone(),
            px_per_cm: m.ratio.map(|r| r.px_per_cm()),
            measurements: m.measurements.clone(),
            issues: m.issues.clone(),
            annotated_path: None,
            error: None,
        }
    }

    /// Report for a frame that could not be processed at all.
    pub fn failed(source: impl Into<String>, error: &dyn fmt::Display) -> Self {
        Self {
            source: source.into(),
            size: None,
            marker: None,
            px_per_cm: None,
            measurements: Vec::new(),
            issues: Vec::new(),
            annotated_path: None,
            error: Some(error.to_string()),
        }
    }
}

/// Report for one CLI run.
#[derive(Debug, Clone, Serialize)]
pub struct MeasureReport {
    pub dictionary: String,
    pub marker_side_cm: f64,
    pub frames: Vec<FrameReport>,
}

impl MeasureReport {
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_round_trip_with_file_dictionary() {
        let dir = tempfile::tempdir().expect("tempdir");
        let dict_path = dir.path().join("dict.json");
        builtins::require_builtin(builtins::PARTSIZE_4X4_50)
            .expect("builtin")
            .write_json(&dict_path)
            .expect("write dict");

        let mut cfg = MeasureConfig::default();
        cfg.params.marker.side_cm = 3.0;
        cfg.dictionary = DictionarySource::File(dict_path);
        let cfg_path = dir.path().join("cfg.json");
        cfg.write_json(&cfg_path).expect("write cfg");

        let loaded = MeasureConfig::load_json(&cfg_path).expect("load");
        assert_eq!(loaded.dictionary, cfg.dictionary);
        assert_eq!(loaded.params.marker.side_cm, 3.0);
        assert_eq!(
            loaded.dictionary.load().expect("dict").name,
            builtins::PARTSIZE_4X4_50
        );
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg: MeasureConfig = serde_json::from_str("{}").expect("parse");
        assert_eq!(cfg.dictionary, DictionarySource::default());
        assert_eq!(cfg.params.segment.min_area_px, 2000.0);
        assert!(cfg.build_pipeline().is_ok());
    }

    #[test]
    fn bad_marker_side_and_unknown_builtin_are_errors() {
        let mut cfg = MeasureConfig::default();
        cfg.params.marker.side_cm = 0.0;
        assert!(matches!(
            cfg.build_pipeline(),
            Err(ConfigError::MarkerSide(_))
        ));

        let cfg = MeasureConfig {
            dictionary: DictionarySource::Builtin("DICT_6X6_250".into()),
            ..MeasureConfig::default()
        };
        assert!(matches!(
            cfg.build_pipeline(),
            Err(ConfigError::Dictionary(DictionaryError::UnknownBuiltin(_)))
        ));
    }
}
