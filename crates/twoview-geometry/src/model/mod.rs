//! # Geometric models
//!
//! Two-view relations estimated from point correspondences:
//!
//! - planar homography, `x2 ~ H x1` (8 DOF, minimal sample of 4), see [`homography_dlt`]
//! - fundamental matrix, `x1ᵀ F x2 = 0` (rank 2, sampled with 8 points), see
//!   [`fundamental_8point`]
//!
//! Both expose a direct linear solver and an [`Estimator`] implementation that plugs into
//! [`crate::ransac::Ransac`].

mod homography;
pub use homography::*;

mod fundamental;
pub use fundamental::*;

use serde::{Deserialize, Serialize};

use crate::correspondence::Correspondence;
use crate::error::GeometryError;
use crate::linalg::Mat33;

/// A model estimator usable inside the robust fitter.
///
/// Implementors turn a set of correspondences into a model and measure how well a single
/// correspondence agrees with a model.
pub trait Estimator {
    /// Model produced by this estimator.
    type Model: Clone;

    /// Number of correspondences in a minimal sample.
    fn sample_size(&self) -> usize;

    /// Estimate a model from `sample_size()` or more correspondences.
    ///
    /// Returns [`GeometryError::DegenerateSample`] when the correspondences do not determine a
    /// model, so that the caller can draw another sample.
    fn estimate(&self, correspondences: &[Correspondence]) -> Result<Self::Model, GeometryError>;

    /// Geometric distance, in pixels, between a correspondence and a model.
    fn distance(&self, model: &Self::Model, correspondence: &Correspondence) -> f64;
}

/// Kind of two-view model to estimate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    /// Planar homography.
    Homography,
    /// Fundamental matrix.
    Fundamental,
}

impl ModelKind {
    /// Minimal sample size used by RANSAC for this model kind.
    pub fn sample_size(&self) -> usize {
        match self {
            ModelKind::Homography => HOMOGRAPHY_SAMPLE_SIZE,
            ModelKind::Fundamental => FUNDAMENTAL_SAMPLE_SIZE,
        }
    }
}

/// An accepted two-view model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum GeometricModel {
    /// Homography mapping image 1 into image 2.
    Homography(Mat33),
    /// Fundamental matrix with `x1ᵀ F x2 = 0`.
    Fundamental(Mat33),
}

impl GeometricModel {
    /// The underlying 3x3 matrix.
    pub fn matrix(&self) -> &Mat33 {
        match self {
            GeometricModel::Homography(m) | GeometricModel::Fundamental(m) => m,
        }
    }

    /// The kind of this model.
    pub fn kind(&self) -> ModelKind {
        match self {
            GeometricModel::Homography(_) => ModelKind::Homography,
            GeometricModel::Fundamental(_) => ModelKind::Fundamental,
        }
    }
}

/// Normalize points with a similarity transform so that they have zero mean and an average
/// distance of sqrt(2) to the origin.
///
/// Returns the normalized points and the transform `T` such that `x_n = T x`.
pub fn normalize_points_2d(x: &[[f64; 2]]) -> (Vec<[f64; 2]>, Mat33) {
    let n = x.len().max(1) as f64;
    let (mut mx, mut my) = (0.0, 0.0);
    for p in x {
        mx += p[0];
        my += p[1];
    }
    mx /= n;
    my /= n;

    let mut mean_dist = 0.0;
    for p in x {
        let dx = p[0] - mx;
        let dy = p[1] - my;
        mean_dist += (dx * dx + dy * dy).sqrt();
    }
    mean_dist /= n;
    let scale = if mean_dist > f64::EPSILON {
        std::f64::consts::SQRT_2 / mean_dist
    } else {
        1.0
    };

    let xn = x
        .iter()
        .map(|p| [(p[0] - mx) * scale, (p[1] - my) * scale])
        .collect();

    // T = [[s,0,-s*mx],[0,s,-s*my],[0,0,1]]
    let t = [
        [scale, 0.0, -scale * mx],
        [0.0, scale, -scale * my],
        [0.0, 0.0, 1.0],
    ];
    (xn, t)
}
