use super::{normalize_points_2d, Estimator};
use crate::correspondence::Correspondence;
use crate::error::GeometryError;
use crate::linalg::{self, Mat33};

/// Minimal number of correspondences that determine a homography.
pub const HOMOGRAPHY_SAMPLE_SIZE: usize = 4;

// relative tolerance on the smallest singular value of the design matrix
const CONDITION_EPS: f64 = 1e-10;

// minimal triangle area between normalized points of a minimal sample
const COLLINEAR_EPS: f64 = 1e-6;

/// Compute the homography matrix from four or more 2d point correspondences.
///
/// The ninth entry of the homography is fixed to one and the remaining eight are solved by
/// linear least squares from the `2n` equations stating that `H x1` and `x2` are parallel
/// homogeneous vectors. The points are first normalized with a similarity transform per image
/// to keep the system well conditioned; the result is exact for four points in general
/// position.
///
/// * `correspondences` - The point pairs, `x2 ~ H x1`.
///
/// # Returns
///
/// The homography from image 1 to image 2 with `H[2][2] == 1`.
///
/// # Errors
///
/// * [`GeometryError::InsufficientCorrespondences`] with fewer than four correspondences.
/// * [`GeometryError::DegenerateSample`] when the points are coincident or collinear, so that
///   the system is singular.
///
/// # Example
///
/// ```
/// use twoview_geometry::model::homography_dlt;
/// use twoview_geometry::Correspondence;
///
/// let corrs = [
///     Correspondence::new(0.0, 0.0, 10.0, 5.0),
///     Correspondence::new(100.0, 0.0, 110.0, 5.0),
///     Correspondence::new(100.0, 100.0, 110.0, 105.0),
///     Correspondence::new(0.0, 100.0, 10.0, 105.0),
/// ];
/// let h = homography_dlt(&corrs).unwrap();
/// assert!((h[0][2] - 10.0).abs() < 1e-9);
/// assert!((h[1][2] - 5.0).abs() < 1e-9);
/// ```
pub fn homography_dlt(correspondences: &[Correspondence]) -> Result<Mat33, GeometryError> {
    let n = correspondences.len();
    if n < HOMOGRAPHY_SAMPLE_SIZE {
        return Err(GeometryError::InsufficientCorrespondences {
            required: HOMOGRAPHY_SAMPLE_SIZE,
            actual: n,
        });
    }

    let x1 = correspondences.iter().map(|c| c.p1()).collect::<Vec<_>>();
    let x2 = correspondences.iter().map(|c| c.p2()).collect::<Vec<_>>();
    let (x1n, t1) = normalize_points_2d(&x1);
    let (x2n, t2) = normalize_points_2d(&x2);

    if n == HOMOGRAPHY_SAMPLE_SIZE && (has_collinear_triplet(&x1n) || has_collinear_triplet(&x2n))
    {
        return Err(GeometryError::DegenerateSample);
    }

    // construct the system A h = b
    let mut mat_a = faer::Mat::<f64>::zeros(2 * n, 8);
    let mut vec_b = vec![0.0; 2 * n];
    for (i, (p, q)) in x1n.iter().zip(x2n.iter()).enumerate() {
        let ([x, y], [u, v]) = (*p, *q);
        mat_a.write(2 * i, 0, x);
        mat_a.write(2 * i, 1, y);
        mat_a.write(2 * i, 2, 1.0);
        mat_a.write(2 * i, 6, -x * u);
        mat_a.write(2 * i, 7, -y * u);
        vec_b[2 * i] = u;

        mat_a.write(2 * i + 1, 3, x);
        mat_a.write(2 * i + 1, 4, y);
        mat_a.write(2 * i + 1, 5, 1.0);
        mat_a.write(2 * i + 1, 6, -x * v);
        mat_a.write(2 * i + 1, 7, -y * v);
        vec_b[2 * i + 1] = v;
    }

    // least squares through the thin SVD: h = V S^-1 U^T b
    let svd = mat_a.thin_svd();
    let s = svd.s_diagonal();
    let (s_max, s_min) = (s.read(0), s.read(7));
    if !s_min.is_finite() || s_max <= 0.0 || s_min <= CONDITION_EPS * s_max {
        return Err(GeometryError::DegenerateSample);
    }

    let (u, v) = (svd.u(), svd.v());
    let mut h = [0.0; 8];
    for k in 0..8 {
        let utb = vec_b
            .iter()
            .enumerate()
            .map(|(r, b)| u.read(r, k) * b)
            .sum::<f64>();
        let coef = utb / s.read(k);
        for (j, hj) in h.iter_mut().enumerate() {
            *hj += v.read(j, k) * coef;
        }
    }

    let homo_n = [[h[0], h[1], h[2]], [h[3], h[4], h[5]], [h[6], h[7], 1.0]];

    // denormalize: H = T2^-1 * Hn * T1
    let t2_inv = linalg::inverse_mat33(&t2, 1e-12).ok_or(GeometryError::DegenerateSample)?;
    let mut homo = linalg::mat33_mul(&linalg::mat33_mul(&t2_inv, &homo_n), &t1);

    if homo[2][2].abs() < f64::EPSILON || homo.iter().flatten().any(|v| !v.is_finite()) {
        return Err(GeometryError::DegenerateSample);
    }
    linalg::normalize_mat33_inplace(&mut homo);

    if linalg::inverse_mat33(&homo, 1e-12).is_none() {
        return Err(GeometryError::DegenerateSample);
    }

    Ok(homo)
}

fn has_collinear_triplet(x: &[[f64; 2]]) -> bool {
    let n = x.len();
    for i in 0..n {
        for j in (i + 1)..n {
            for k in (j + 1)..n {
                let (a, b, c) = (x[i], x[j], x[k]);
                let area = ((b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])).abs();
                if area < COLLINEAR_EPS {
                    return true;
                }
            }
        }
    }
    false
}

/// Euclidean distance between `H x1` and `x2`, in pixels of image 2.
///
/// Returns infinity if `x1` is mapped to the line at infinity.
pub fn homography_transfer_error(homo: &Mat33, correspondence: &Correspondence) -> f64 {
    match linalg::transform_point2(homo, &correspondence.p1()) {
        Some([u, v]) => ((u - correspondence.x2).powi(2) + (v - correspondence.y2).powi(2)).sqrt(),
        None => f64::INFINITY,
    }
}

/// Algebraic residuals `|H x1 × x2|` for each correspondence.
///
/// A homography consistent with a correspondence maps `x1` to a vector parallel to `x2`, so
/// each residual is zero for exact data.
pub fn homography_residuals(homo: &Mat33, correspondences: &[Correspondence]) -> Vec<f64> {
    correspondences
        .iter()
        .map(|c| {
            let hx1 = linalg::mat33_mul_vec3(homo, &c.h1());
            let r = linalg::cross_vec3(&hx1, &c.h2());
            linalg::dot_vec3(&r, &r).sqrt()
        })
        .collect()
}

/// Homography estimator for the robust fitter.
///
/// Samples four correspondences and scores with the transfer error in image 2.
#[derive(Clone, Copy, Debug, Default)]
pub struct HomographyEstimator;

impl Estimator for HomographyEstimator {
    type Model = Mat33;

    fn sample_size(&self) -> usize {
        HOMOGRAPHY_SAMPLE_SIZE
    }

    fn estimate(&self, correspondences: &[Correspondence]) -> Result<Mat33, GeometryError> {
        homography_dlt(correspondences)
    }

    fn distance(&self, model: &Mat33, correspondence: &Correspondence) -> f64 {
        homography_transfer_error(model, correspondence)
    }
}
