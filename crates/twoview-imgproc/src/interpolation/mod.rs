//! Pixel interpolation used when resampling images during geometric transformations.
//!
//! The caller is responsible for bounds checks: samplers assume `0 <= u < cols` and
//! `0 <= v < rows`.

mod bilinear;

pub use bilinear::bilinear_interpolation;
