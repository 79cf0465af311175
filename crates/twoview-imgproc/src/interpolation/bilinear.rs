use twoview_image::Image;

/// Kernel for bilinear interpolation
///
/// Neighbours past the last row or column are clamped to the border, so any coordinate in
/// `[0, cols) x [0, rows)` is valid.
///
/// # Arguments
///
/// * `image` - The input image container.
/// * `u` - The x coordinate of the pixel to interpolate.
/// * `v` - The y coordinate of the pixel to interpolate.
///
/// # Returns
///
/// The interpolated pixel values.
pub fn bilinear_interpolation<const C: usize>(image: &Image<f32, C>, u: f32, v: f32) -> [f32; C] {
    let (rows, cols) = (image.rows(), image.cols());
    if rows == 0 || cols == 0 {
        return [0.0; C];
    }

    let iu = u.max(0.0).trunc() as usize;
    let iv = v.max(0.0).trunc() as usize;

    let iu0 = iu.min(cols - 1);
    let iv0 = iv.min(rows - 1);

    let frac_u = u.fract().max(0.0);
    let frac_v = v.fract().max(0.0);

    let frac_uu = 1.0 - frac_u;
    let frac_vv = 1.0 - frac_v;

    let w00 = frac_uu * frac_vv;
    let w01 = frac_u * frac_vv;
    let w10 = frac_uu * frac_v;
    let w11 = frac_u * frac_v;

    let iu1 = if iu0 + 1 < cols { iu0 + 1 } else { iu0 };
    let iv1 = if iv0 + 1 < rows { iv0 + 1 } else { iv0 };

    let data = image.as_slice();
    let at = |x: usize, y: usize| {
        let base = (y * cols + x) * C;
        &data[base..base + C]
    };

    let (p00, p01) = (at(iu0, iv0), at(iu1, iv0));
    let (p10, p11) = (at(iu0, iv1), at(iu1, iv1));

    let mut pixel = [0.0; C];
    for k in 0..C {
        pixel[k] = p00[k] * w00 + p01[k] * w01 + p10[k] * w10 + p11[k] * w11;
    }

    pixel
}
