//! Square fiducial marker detection for scale calibration.
//!
//! This crate focuses on:
//! - marker dictionaries: deterministic built-ins and JSON-loaded tables,
//! - matching observed marker codes against a dictionary under rotation,
//! - finding convex quadrilateral candidates in a grayscale image,
//! - decoding the bit grid inside each candidate.
//!
//! [`MarkerDetector`] wires these together and returns markers with their
//! image corners ordered clockwise from the marker's own top-left corner.

pub mod builtins;
mod decode;
mod detector;
mod dictionary;
mod matcher;
mod quads;

pub use decode::{decode_quad, DecodeParams, MarkerDetection};
pub use detector::{MarkerDetector, MarkerDetectorParams};
pub use dictionary::{generate_dictionary, Dictionary, DictionaryError, OpenCvDictionary};
pub use matcher::{rotate_code, Match, Matcher};
pub use quads::{find_quad_candidates, QuadParams};
