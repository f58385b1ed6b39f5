//! Measure object sizes in photos using a printed reference marker.
//!
//! This crate provides:
//! - stable, convenient re-exports of the underlying `partsize-*` crates
//! - JSON configuration and report types ([`io`])
//! - end-to-end helpers from encoded bytes or files to reports ([`process`])
//! - the `partsize` command-line tool (feature `cli`)
//!
//! ## Quickstart
//!
//! ```no_run
//! use partsize::aruco::builtins;
//! use partsize::measure::{load_frame, MeasureParams, Pipeline};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let frame = load_frame("desk.jpg")?;
//! let pipeline = Pipeline::new(&MeasureParams::default(), builtins::default_dictionary());
//!
//! let out = pipeline.process(&frame);
//! for m in &out.measurement.measurements {
//!     println!("{} / {}", m.width_label(), m.height_label());
//! }
//! out.annotated.save("desk_measured.png")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## API map
//! - `partsize::core`: geometry helpers, homographies, image views, logger.
//! - `partsize::aruco`: marker dictionaries, quad candidates, decoding.
//! - `partsize::measure`: calibration, segmentation, reporting, pipeline.
//! - `partsize::print`: printable reference markers.
//!
//! The physical marker size is configuration (`MeasureParams::marker`); the
//! default is a 5 cm marker from the built-in `PARTSIZE_5X5_50` dictionary.

pub use partsize_aruco as aruco;
pub use partsize_core as core;
pub use partsize_measure as measure;
pub use partsize_print as print;

pub use partsize_aruco::{Dictionary, MarkerDetection};
pub use partsize_measure::{
    FrameIssue, FrameMeasurement, MeasureParams, Measurement, Pipeline, ProcessedFrame,
};

pub mod io;
pub mod process;

pub use io::{ConfigError, DictionarySource, FrameReport, IoError, MeasureConfig, MeasureReport};
