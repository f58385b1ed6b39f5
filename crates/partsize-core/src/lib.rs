//! Core types and utilities for marker-calibrated object measurement.
//!
//! This crate is intentionally small and purely geometric. It does *not*
//! depend on any image decoding crate: pixels are accessed through the
//! borrowed [`GrayImageView`], and shapes are plain `nalgebra` points.

mod geometry;
mod homography;
mod image;
mod logger;

pub use geometry::{
    centroid, drop_collinear_vertices, is_convex, order_clockwise, point_in_convex_polygon,
    polygon_area, polygon_perimeter, signed_area, RotatedRect,
};
pub use homography::{homography_from_4pt, square_to_quad, Homography};
pub use image::{GrayImage, GrayImageView};

#[cfg(feature = "tracing")]
pub use logger::init_tracing;

pub use logger::init_with_level;
