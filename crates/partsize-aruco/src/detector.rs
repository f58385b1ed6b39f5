//! End-to-end marker detection on a grayscale image.

use crate::{
    decode_quad, find_quad_candidates, DecodeParams, Dictionary, MarkerDetection, Matcher,
    QuadParams,
};
use image::GrayImage;
use partsize_core::GrayImageView;
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

/// Parameters for [`MarkerDetector`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerDetectorParams {
    pub quads: QuadParams,
    pub decode: DecodeParams,
}

/// Finds and decodes markers of one dictionary.
#[derive(Clone, Debug)]
pub struct MarkerDetector {
    dictionary: Dictionary,
    matcher: Matcher,
    params: MarkerDetectorParams,
}

impl MarkerDetector {
    pub fn new(dictionary: Dictionary, params: MarkerDetectorParams) -> Self {
        let matcher = Matcher::new(&dictionary, params.decode.max_hamming);
        Self {
            dictionary,
            matcher,
            params,
        }
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// All decoded markers, best score first. Equal scores keep the order in
    /// which their quads were found, so results are deterministic.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "info", skip_all, fields(w = image.width(), h = image.height()))
    )]
    pub fn detect(&self, image: &GrayImage) -> Vec<MarkerDetection> {
        let Some(view) = GrayImageView::new(
            image.width() as usize,
            image.height() as usize,
            image.as_raw(),
        ) else {
            return Vec::new();
        };

        let quads = find_quad_candidates(image, &self.params.quads);
        let mut found: Vec<MarkerDetection> = quads
            .iter()
            .filter_map(|q| decode_quad(&view, q, &self.params.decode, &self.matcher))
            .collect();
        found.sort_by(|a, b| b.score.total_cmp(&a.score));

        log::debug!(
            "{} quad candidates, {} markers from {}",
            quads.len(),
            found.len(),
            self.dictionary.name
        );
        found
    }

    /// The best-scoring marker, if any.
    pub fn detect_first(&self, image: &GrayImage) -> Option<MarkerDetection> {
        self.detect(image).into_iter().next()
    }
}
