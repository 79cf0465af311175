use crate::correspondence::Correspondence;
use crate::linalg::{self, Mat33};

/// Project a deterministic cloud of 3d points into two pinhole cameras.
pub(crate) fn two_view_scene(n: usize) -> Vec<Correspondence> {
    let k = [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]];
    let (c, s) = (0.1f64.cos(), 0.1f64.sin());
    let r = [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]];
    let t = [-1.0, 0.1, 0.05];

    (0..n)
        .map(|i| {
            let fi = i as f64;
            let x = [
                2.0 * (fi * 0.7).sin(),
                1.5 * (fi * 1.3).cos(),
                7.0 + 3.0 * (fi * 0.45).sin(),
            ];
            let xc2 = linalg::mat33_mul_vec3(&r, &x);
            let xc2 = [xc2[0] + t[0], xc2[1] + t[1], xc2[2] + t[2]];
            let p1 = linalg::mat33_mul_vec3(&k, &x);
            let p2 = linalg::mat33_mul_vec3(&k, &xc2);
            Correspondence::new(p1[0] / p1[2], p1[1] / p1[2], p2[0] / p2[2], p2[1] / p2[2])
        })
        .collect()
}

/// Map a regular grid of points through `h`.
pub(crate) fn homography_grid(h: &Mat33, cols: usize, rows: usize) -> Vec<Correspondence> {
    let mut out = Vec::with_capacity(cols * rows);
    for j in 0..rows {
        for i in 0..cols {
            let p = [10.0 + i as f64 * 23.0, 15.0 + j as f64 * 19.0];
            if let Some(q) = linalg::transform_point2(h, &p) {
                out.push(Correspondence::from_points(p, q));
            }
        }
    }
    out
}
