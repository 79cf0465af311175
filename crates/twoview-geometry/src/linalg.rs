//! Helpers over row-major `[[f64; 3]; 3]` matrices and `[f64; 3]` vectors.

/// Row-major 3x3 matrix.
pub type Mat33 = [[f64; 3]; 3];

/// The 3x3 identity matrix.
pub const IDENTITY: Mat33 = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];

/// Compute the determinant of a 3x3 matrix.
///
/// Example:
/// ```
/// use twoview_geometry::linalg::{det_mat33, IDENTITY};
///
/// assert_eq!(det_mat33(&IDENTITY), 1.0);
/// ```
#[rustfmt::skip]
pub fn det_mat33(m: &Mat33) -> f64 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]) -
    m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]) +
    m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Invert a 3x3 matrix through its adjugate.
///
/// The matrix is considered singular when `|det| <= eps * |r0| * |r1| * |r2|`, with `ri` the
/// rows of `m`. By Hadamard's inequality the ratio is at most one, and it does not depend on
/// the scale of `m`.
///
/// # Arguments
///
/// * `m` - The matrix to invert.
/// * `eps` - Relative tolerance on the determinant.
///
/// # Returns
///
/// The inverse matrix, or `None` if the matrix is singular or not finite.
pub fn inverse_mat33(m: &Mat33, eps: f64) -> Option<Mat33> {
    let det = det_mat33(m);
    let bound = m
        .iter()
        .map(|r| dot_vec3(r, r).sqrt())
        .product::<f64>();
    if !det.is_finite() || bound == 0.0 || det.abs() <= eps * bound {
        return None;
    }

    let adj = [
        [
            m[1][1] * m[2][2] - m[1][2] * m[2][1],
            m[0][2] * m[2][1] - m[0][1] * m[2][2],
            m[0][1] * m[1][2] - m[0][2] * m[1][1],
        ],
        [
            m[1][2] * m[2][0] - m[1][0] * m[2][2],
            m[0][0] * m[2][2] - m[0][2] * m[2][0],
            m[0][2] * m[1][0] - m[0][0] * m[1][2],
        ],
        [
            m[1][0] * m[2][1] - m[1][1] * m[2][0],
            m[0][1] * m[2][0] - m[0][0] * m[2][1],
            m[0][0] * m[1][1] - m[0][1] * m[1][0],
        ],
    ];

    let inv_det = 1.0 / det;
    let mut inv = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            inv[i][j] = adj[i][j] * inv_det;
        }
    }
    Some(inv)
}

/// Multiply two 3x3 matrices, `a * b`.
pub fn mat33_mul(a: &Mat33, b: &Mat33) -> Mat33 {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }
    out
}

/// Multiply a 3x3 matrix with a 3d vector.
pub fn mat33_mul_vec3(m: &Mat33, v: &[f64; 3]) -> [f64; 3] {
    [
        m[0][0] * v[0] + m[0][1] * v[1] + m[0][2] * v[2],
        m[1][0] * v[0] + m[1][1] * v[1] + m[1][2] * v[2],
        m[2][0] * v[0] + m[2][1] * v[1] + m[2][2] * v[2],
    ]
}

/// Transpose a 3x3 matrix.
pub fn transpose_mat33(m: &Mat33) -> Mat33 {
    [
        [m[0][0], m[1][0], m[2][0]],
        [m[0][1], m[1][1], m[2][1]],
        [m[0][2], m[1][2], m[2][2]],
    ]
}

/// Cross product of two 3d vectors.
pub fn cross_vec3(a: &[f64; 3], b: &[f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

/// Dot product of two 3d vectors.
pub fn dot_vec3(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Scale a 3x3 matrix in place so that its bottom-right entry is one.
///
/// Leaves the matrix untouched if that entry is (numerically) zero.
pub fn normalize_mat33_inplace(m: &mut Mat33) {
    let w = m[2][2];
    if w.abs() < f64::EPSILON {
        return;
    }
    m.iter_mut().flatten().for_each(|v| *v /= w);
}

/// Map a 2d point through a 3x3 projective transform.
///
/// Returns `None` when the mapped point lies at infinity.
///
/// Example:
/// ```
/// use twoview_geometry::linalg::transform_point2;
///
/// let m = [[1.0, 0.0, 10.0], [0.0, 1.0, 5.0], [0.0, 0.0, 1.0]];
/// assert_eq!(transform_point2(&m, &[1.0, 1.0]), Some([11.0, 6.0]));
/// ```
pub fn transform_point2(m: &Mat33, p: &[f64; 2]) -> Option<[f64; 2]> {
    let q = mat33_mul_vec3(m, &[p[0], p[1], 1.0]);
    if q[2].abs() < 1e-12 || !q[2].is_finite() {
        return None;
    }
    Some([q[0] / q[2], q[1] / q[2]])
}

/// Copy a `[[f64; 3]; 3]` into a faer matrix.
pub(crate) fn to_faer_mat33(m: &Mat33) -> faer::Mat<f64> {
    faer::mat![
        [m[0][0], m[0][1], m[0][2]],
        [m[1][0], m[1][1], m[1][2]],
        [m[2][0], m[2][1], m[2][2]]
    ]
}

/// Singular values of a 3x3 matrix in non-increasing order.
pub fn singular_values_mat33(m: &Mat33) -> [f64; 3] {
    let svd = to_faer_mat33(m).svd();
    let s = svd.s_diagonal();
    [s.read(0), s.read(1), s.read(2)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_det_mat33() {
        let m = [[2.0, 0.0, 1.0], [1.0, 3.0, 2.0], [1.0, 1.0, 1.0]];
        assert_relative_eq!(det_mat33(&m), 0.0, epsilon = 1e-12);
        let m = [[2.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 4.0]];
        assert_relative_eq!(det_mat33(&m), 24.0);
    }

    #[test]
    fn test_inverse_mat33() -> Result<(), Box<dyn std::error::Error>> {
        let m = [[1.2, 0.1, 5.0], [0.0, 0.9, -3.0], [0.001, 0.002, 1.0]];
        let inv = inverse_mat33(&m, 1e-12).ok_or("singular")?;
        let prod = mat33_mul(&m, &inv);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(prod[i][j], IDENTITY[i][j], epsilon = 1e-12);
            }
        }
        Ok(())
    }

    #[test]
    fn test_inverse_mat33_singular() {
        let m = [[1.0, 2.0, 3.0], [2.0, 4.0, 6.0], [0.0, 0.0, 1.0]];
        assert!(inverse_mat33(&m, 1e-12).is_none());
        assert!(inverse_mat33(&[[0.0; 3]; 3], 1e-12).is_none());
        let m = [[f64::NAN, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]];
        assert!(inverse_mat33(&m, 1e-12).is_none());
    }

    #[test]
    fn test_inverse_mat33_scale_invariant() {
        // a tiny but well conditioned matrix must still be invertible
        let m = [[1e-4, 0.0, 0.0], [0.0, 1e-4, 0.0], [0.0, 0.0, 1e-4]];
        assert!(inverse_mat33(&m, 1e-12).is_some());
    }

    #[test]
    fn test_transpose_and_mul_vec3() {
        let m = [[1.0, 2.0, 3.0], [4.0, 5.0, 6.0], [7.0, 8.0, 9.0]];
        let mt = transpose_mat33(&m);
        assert_eq!(mt[0], [1.0, 4.0, 7.0]);
        assert_eq!(mat33_mul_vec3(&m, &[1.0, 0.0, 0.0]), [1.0, 4.0, 7.0]);
    }

    #[test]
    fn test_cross_vec3() {
        let c = cross_vec3(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]);
        assert_eq!(c, [0.0, 0.0, 1.0]);
        assert_eq!(dot_vec3(&c, &[0.0, 0.0, 2.0]), 2.0);
    }

    #[test]
    fn test_normalize_mat33_inplace() {
        let mut m = [[2.0, 0.0, 4.0], [0.0, 2.0, 6.0], [0.0, 0.0, 2.0]];
        normalize_mat33_inplace(&mut m);
        assert_eq!(m, [[1.0, 0.0, 2.0], [0.0, 1.0, 3.0], [0.0, 0.0, 1.0]]);
    }

    #[test]
    fn test_transform_point2_at_infinity() {
        let m = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]];
        assert_eq!(transform_point2(&m, &[0.0, 3.0]), None);
    }

    #[test]
    fn test_singular_values_mat33() {
        let m = [[3.0, 0.0, 0.0], [0.0, -5.0, 0.0], [0.0, 0.0, 0.0]];
        let s = singular_values_mat33(&m);
        assert_relative_eq!(s[0], 5.0, epsilon = 1e-12);
        assert_relative_eq!(s[1], 3.0, epsilon = 1e-12);
        assert_relative_eq!(s[2], 0.0, epsilon = 1e-12);
    }
}
