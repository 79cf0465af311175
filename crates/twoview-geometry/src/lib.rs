#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Point correspondences between two images.
pub mod correspondence;

/// Epipolar line queries.
pub mod epipolar;

/// Error types for the geometry module.
pub mod error;

/// Small fixed-size linear algebra utilities.
pub mod linalg;

/// Geometric models and their minimal solvers.
pub mod model;

/// Robust model fitting with RANSAC.
pub mod ransac;

pub use crate::correspondence::Correspondence;
pub use crate::error::GeometryError;
pub use crate::model::{
    FundamentalEstimator, GeometricModel, HomographyEstimator, ModelKind, Normalization,
};
pub use crate::ransac::{fit_model, RandomSource, Ransac, RansacParams, RansacReport};

#[cfg(test)]
pub(crate) mod test_utils;
