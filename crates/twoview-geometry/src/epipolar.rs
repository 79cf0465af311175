use serde::{Deserialize, Serialize};

use crate::linalg::{self, Mat33};

// relative size of `b` below which a line is treated as vertical
const VERTICAL_EPS: f64 = 1e-9;

/// One of the two images of a pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum View {
    /// Image 1, drawn on the left.
    First,
    /// Image 2, drawn on the right.
    Second,
}

impl View {
    /// The other image of the pair.
    pub fn other(&self) -> View {
        match self {
            View::First => View::Second,
            View::Second => View::First,
        }
    }
}

/// Epipolar line `Fᵀ x1` in image 2 of a point in image 1, as `(a, b, c)` with
/// `a x + b y + c = 0`.
pub fn epipolar_line_in_image2(f: &Mat33, p1: &[f64; 2]) -> [f64; 3] {
    linalg::mat33_mul_vec3(&linalg::transpose_mat33(f), &[p1[0], p1[1], 1.0])
}

/// Epipolar line `F x2` in image 1 of a point in image 2.
pub fn epipolar_line_in_image1(f: &Mat33, p2: &[f64; 2]) -> [f64; 3] {
    linalg::mat33_mul_vec3(f, &[p2[0], p2[1], 1.0])
}

/// Endpoints of `line` across an image of size `width x height`.
///
/// The endpoints lie on the left and right borders, `x = 0` and `x = width`. For
/// (near-)vertical lines they lie on the top and bottom borders instead. Returns `None` when
/// the line has no direction, i.e. `a = b = 0`.
pub fn line_endpoints(line: &[f64; 3], width: f64, height: f64) -> Option<([f64; 2], [f64; 2])> {
    let [a, b, c] = *line;
    let norm = (a * a + b * b).sqrt();
    if !norm.is_finite() || norm < f64::EPSILON || !c.is_finite() {
        return None;
    }

    if b.abs() > VERTICAL_EPS * norm {
        let y_at = |x: f64| -(c + a * x) / b;
        Some(([0.0, y_at(0.0)], [width, y_at(width)]))
    } else {
        let x_at = |y: f64| -(c + b * y) / a;
        Some(([x_at(0.0), 0.0], [x_at(height), height]))
    }
}

/// Two images drawn next to each other, image 1 on the left and image 2 on the right, both
/// aligned to the top edge.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SideBySide {
    /// Size `[width, height]` of image 1.
    pub left: [usize; 2],
    /// Size `[width, height]` of image 2.
    pub right: [usize; 2],
}

impl SideBySide {
    /// Create a layout from the sizes of both images.
    pub fn new(left: [usize; 2], right: [usize; 2]) -> Self {
        Self { left, right }
    }

    /// Width of the whole screen.
    pub fn width(&self) -> usize {
        self.left[0] + self.right[0]
    }

    /// Height of the whole screen.
    pub fn height(&self) -> usize {
        self.left[1].max(self.right[1])
    }

    /// Size `[width, height]` of one of the images.
    pub fn size_of(&self, view: View) -> [usize; 2] {
        match view {
            View::First => self.left,
            View::Second => self.right,
        }
    }

    /// Find the image under a screen point and the point in that image's frame.
    ///
    /// Returns `None` outside both images.
    pub fn locate(&self, screen: [f64; 2]) -> Option<(View, [f64; 2])> {
        let [x, y] = screen;
        let [wl, hl] = self.left.map(|v| v as f64);
        let [wr, hr] = self.right.map(|v| v as f64);
        if y < 0.0 || x < 0.0 {
            return None;
        }
        if x < wl && y < hl {
            Some((View::First, [x, y]))
        } else if x >= wl && x < wl + wr && y < hr {
            Some((View::Second, [x - wl, y]))
        } else {
            None
        }
    }

    /// Map a point in an image's frame to screen coordinates.
    pub fn to_screen(&self, view: View, p: [f64; 2]) -> [f64; 2] {
        match view {
            View::First => p,
            View::Second => [p[0] + self.left[0] as f64, p[1]],
        }
    }
}

/// Epipolar line of a screen query, drawn in the other image.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EpipolarSegment {
    /// Image the line lies in.
    pub view: View,
    /// Line coefficients `(a, b, c)` in the frame of `view`.
    pub line: [f64; 3],
    /// Endpoints in the frame of `view`.
    pub endpoints: [[f64; 2]; 2],
    /// Endpoints in screen coordinates.
    pub screen_endpoints: [[f64; 2]; 2],
}

/// Epipolar line, in the other image, of a point clicked on a side-by-side screen.
///
/// A point in image 1 gives the line `Fᵀ x1` in image 2 and a point in image 2 gives the line
/// `F x2` in image 1. Returns `None` if the point is outside both images or if the line is
/// undefined, e.g. when querying the epipole.
///
/// # Example
///
/// ```
/// use twoview_geometry::epipolar::{epipolar_segment, SideBySide, View};
///
/// // pure horizontal translation: epipolar lines are the image rows
/// let f = [[0.0, 0.0, 0.0], [0.0, 0.0, -1.0], [0.0, 1.0, 0.0]];
/// let layout = SideBySide::new([100, 80], [120, 90]);
///
/// let seg = epipolar_segment(&f, &layout, [30.0, 40.0]).unwrap();
/// assert_eq!(seg.view, View::Second);
/// assert_eq!(seg.endpoints, [[0.0, 40.0], [120.0, 40.0]]);
/// assert_eq!(seg.screen_endpoints, [[100.0, 40.0], [220.0, 40.0]]);
/// ```
pub fn epipolar_segment(
    f: &Mat33,
    layout: &SideBySide,
    screen: [f64; 2],
) -> Option<EpipolarSegment> {
    let (clicked, p) = layout.locate(screen)?;
    let view = clicked.other();
    let line = match clicked {
        View::First => epipolar_line_in_image2(f, &p),
        View::Second => epipolar_line_in_image1(f, &p),
    };

    let [w, h] = layout.size_of(view).map(|v| v as f64);
    let (start, end) = line_endpoints(&line, w, h)?;

    Some(EpipolarSegment {
        view,
        line,
        endpoints: [start, end],
        screen_endpoints: [layout.to_screen(view, start), layout.to_screen(view, end)],
    })
}
