use rayon::prelude::*;

use twoview_image::Image;

/// Apply a function to each row of the image in parallel.
///
/// `f` receives the row index and the row's interleaved pixel data. Rows are disjoint, so
/// every output value is written by exactly one call.
pub fn par_iter_rows_indexed_mut<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, &mut [T]) + Send + Sync,
) where
    T: Send,
{
    let row_len = C * dst.cols();
    if row_len == 0 {
        return;
    }
    dst.as_slice_mut()
        .par_chunks_exact_mut(row_len)
        .enumerate()
        .for_each(|(row, chunk)| f(row, chunk));
}

/// Fill every pixel of the image in parallel from its `(x, y)` coordinates.
pub fn par_fill_pixels<T, const C: usize>(
    dst: &mut Image<T, C>,
    f: impl Fn(usize, usize) -> [T; C] + Send + Sync,
) where
    T: Send,
{
    par_iter_rows_indexed_mut(dst, |y, row| {
        for (x, pixel) in row.chunks_exact_mut(C).enumerate() {
            for (out, val) in pixel.iter_mut().zip(f(x, y)) {
                *out = val;
            }
        }
    });
}
