use twoview_geometry::linalg::{self, Mat33};
use twoview_image::Image;

use crate::error::ComposeError;
use crate::interpolation::bilinear_interpolation;

// relative tolerance on the determinant, see `linalg::inverse_mat33`
const SINGULAR_EPS: f64 = 1e-12;

/// Invert a homography.
///
/// The inverse is scaled so that its bottom-right entry is one whenever that entry is
/// non-zero.
///
/// # Errors
///
/// [`ComposeError::SingularTransform`] if the matrix is singular, ill-conditioned or contains
/// non-finite values.
pub fn inverse_homography(h: &Mat33) -> Result<Mat33, ComposeError> {
    let mut inv = linalg::inverse_mat33(h, SINGULAR_EPS).ok_or(ComposeError::SingularTransform)?;
    linalg::normalize_mat33_inplace(&mut inv);
    if inv.iter().flatten().any(|v| !v.is_finite()) {
        return Err(ComposeError::SingularTransform);
    }
    Ok(inv)
}

/// Map the point `(x, y)` through a homography.
///
/// Returns `None` when the point maps to infinity.
pub fn transform_point(x: f64, y: f64, m: &Mat33) -> Option<(f64, f64)> {
    let [u, v] = linalg::transform_point2(m, &[x, y])?;
    if u.is_finite() && v.is_finite() {
        Some((u, v))
    } else {
        None
    }
}

/// Whether the continuous coordinate `(x, y)` lies inside an image of `cols x rows` pixels.
pub fn is_inside(x: f64, y: f64, cols: usize, rows: usize) -> bool {
    x >= 0.0 && x < cols as f64 && y >= 0.0 && y < rows as f64
}

/// Sample `src` bilinearly at `(x, y)`, or `None` outside its bounds.
pub fn sample_bilinear<const C: usize>(src: &Image<f32, C>, x: f64, y: f64) -> Option<[f32; C]> {
    if is_inside(x, y, src.cols(), src.rows()) {
        Some(bilinear_interpolation(src, x as f32, y as f32))
    } else {
        None
    }
}
