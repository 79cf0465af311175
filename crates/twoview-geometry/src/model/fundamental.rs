use serde::{Deserialize, Serialize};

use super::{normalize_points_2d, Estimator};
use crate::correspondence::Correspondence;
use crate::error::GeometryError;
use crate::linalg::{self, Mat33};

/// Number of correspondences drawn per RANSAC sample for the fundamental matrix.
pub const FUNDAMENTAL_SAMPLE_SIZE: usize = 8;

// relative tolerance on the 8th singular value of the design matrix
const CONDITION_EPS: f64 = 1e-10;

/// Coordinate normalization applied before solving for the fundamental matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Normalization {
    /// Per-image similarity transform: centroid at the origin, mean distance sqrt(2).
    #[default]
    Isotropic,
    /// Fixed scale factor applied to both images, e.g. `1e-3` for pixel coordinates.
    Scale(f64),
}

impl Normalization {
    /// Normalize `points` and return them together with the transform `T`, `x_n = T x`.
    pub fn apply(&self, points: &[[f64; 2]]) -> (Vec<[f64; 2]>, Mat33) {
        match *self {
            Normalization::Isotropic => normalize_points_2d(points),
            Normalization::Scale(s) => {
                let xn = points.iter().map(|p| [p[0] * s, p[1] * s]).collect();
                (xn, [[s, 0.0, 0.0], [0.0, s, 0.0], [0.0, 0.0, 1.0]])
            }
        }
    }
}

/// Estimate the fundamental matrix using the normalized 8-point algorithm.
///
/// The convention is `x1ᵀ F x2 = 0`, so `Fᵀ x1` is the epipolar line of `x1` in image 2.
///
/// The steps are:
/// 1. normalize the coordinates of both images (see [`Normalization`]);
/// 2. stack one bilinear constraint per correspondence into an `n x 9` matrix, padded with
///    zero rows to at least `9 x 9`, and take the right singular vector of the smallest
///    singular value;
/// 3. enforce the rank-2 constraint with [`enforce_rank2`];
/// 4. undo the normalization, `F = T1ᵀ F_n T2`, and scale `F` to unit Frobenius norm.
///
/// # Errors
///
/// * [`GeometryError::InsufficientCorrespondences`] with fewer than eight correspondences.
/// * [`GeometryError::DegenerateSample`] when the constraint matrix has rank below eight, e.g.
///   for repeated or collinear points.
pub fn fundamental_8point(
    correspondences: &[Correspondence],
    normalization: Normalization,
) -> Result<Mat33, GeometryError> {
    let n = correspondences.len();
    if n < FUNDAMENTAL_SAMPLE_SIZE {
        return Err(GeometryError::InsufficientCorrespondences {
            required: FUNDAMENTAL_SAMPLE_SIZE,
            actual: n,
        });
    }
    if let Normalization::Scale(s) = normalization {
        if !(s.is_finite() && s > 0.0) {
            return Err(GeometryError::InvalidParameter(format!(
                "normalization scale must be positive, got {s}"
            )));
        }
    }

    let x1 = correspondences.iter().map(|c| c.p1()).collect::<Vec<_>>();
    let x2 = correspondences.iter().map(|c| c.p2()).collect::<Vec<_>>();
    let (x1n, t1) = normalization.apply(&x1);
    let (x2n, t2) = normalization.apply(&x2);

    // build design matrix A (max(n, 9) x 9) for x1' * F * x2 = 0
    let mut a = faer::Mat::<f64>::zeros(n.max(9), 9);
    for (i, (p, q)) in x1n.iter().zip(x2n.iter()).enumerate() {
        let ([x, y], [xp, yp]) = (*p, *q);
        a.write(i, 0, x * xp);
        a.write(i, 1, x * yp);
        a.write(i, 2, x);
        a.write(i, 3, y * xp);
        a.write(i, 4, y * yp);
        a.write(i, 5, y);
        a.write(i, 6, xp);
        a.write(i, 7, yp);
        a.write(i, 8, 1.0);
    }

    // solve Af = 0 via SVD: take last column of V
    let svd = a.svd();
    let s = svd.s_diagonal();
    let (s_max, s_8th) = (s.read(0), s.read(7));
    if !s_8th.is_finite() || s_max <= 0.0 || s_8th <= CONDITION_EPS * s_max {
        return Err(GeometryError::DegenerateSample);
    }

    let fvec = svd.v().col(8);
    let f_n = [
        [fvec.read(0), fvec.read(1), fvec.read(2)],
        [fvec.read(3), fvec.read(4), fvec.read(5)],
        [fvec.read(6), fvec.read(7), fvec.read(8)],
    ];

    let f_rank2 = enforce_rank2(&f_n);

    // denormalize: F = T1^T * F * T2
    let t1t = linalg::transpose_mat33(&t1);
    let mut f = linalg::mat33_mul(&linalg::mat33_mul(&t1t, &f_rank2), &t2);

    let norm = f.iter().flatten().map(|v| v * v).sum::<f64>().sqrt();
    if !norm.is_finite() || norm < f64::EPSILON {
        return Err(GeometryError::DegenerateSample);
    }
    f.iter_mut().flatten().for_each(|v| *v /= norm);

    Ok(f)
}

/// Project a 3x3 matrix onto the closest rank-2 matrix in Frobenius norm.
///
/// Computes `F = U diag(s1, s2, s3) Vᵀ` and rebuilds it with `s3 = 0`.
pub fn enforce_rank2(f: &Mat33) -> Mat33 {
    let svd = linalg::to_faer_mat33(f).svd();
    let (u, v, s) = (svd.u(), svd.v(), svd.s_diagonal());

    let mut out = [[0.0; 3]; 3];
    for k in 0..2 {
        let sk = s.read(k);
        for (i, row) in out.iter_mut().enumerate() {
            for (j, val) in row.iter_mut().enumerate() {
                *val += sk * u.read(i, k) * v.read(j, k);
            }
        }
    }
    out
}

/// Distance in pixels from `x2` to the epipolar line `Fᵀ x1` in image 2.
///
/// The algebraic residual `x1ᵀ F x2` is divided by the norm of the line normal `(a, b)`,
/// which turns it into the perpendicular point-to-line distance. Returns infinity when the
/// line is undefined.
pub fn epipolar_distance(f: &Mat33, correspondence: &Correspondence) -> f64 {
    let line = linalg::mat33_mul_vec3(&linalg::transpose_mat33(f), &correspondence.h1());
    let denom = (line[0] * line[0] + line[1] * line[1]).sqrt();
    if denom < 1e-12 || !denom.is_finite() {
        return f64::INFINITY;
    }
    linalg::dot_vec3(&line, &correspondence.h2()).abs() / denom
}

/// Fundamental matrix estimator for the robust fitter.
///
/// Samples eight correspondences and scores with [`epipolar_distance`].
#[derive(Clone, Copy, Debug, Default)]
pub struct FundamentalEstimator {
    /// Coordinate normalization used by the 8-point solver.
    pub normalization: Normalization,
}

impl FundamentalEstimator {
    /// Create an estimator with the given normalization.
    pub fn new(normalization: Normalization) -> Self {
        Self { normalization }
    }
}

impl Estimator for FundamentalEstimator {
    type Model = Mat33;

    fn sample_size(&self) -> usize {
        FUNDAMENTAL_SAMPLE_SIZE
    }

    fn estimate(&self, correspondences: &[Correspondence]) -> Result<Mat33, GeometryError> {
        fundamental_8point(correspondences, self.normalization)
    }

    fn distance(&self, model: &Mat33, correspondence: &Correspondence) -> f64 {
        epipolar_distance(model, correspondence)
    }
}
