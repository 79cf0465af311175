//! Robust two-view geometry and panorama stitching.
//!
//! - [`geometry`]: homography and fundamental matrix estimation, RANSAC, epipolar lines.
//! - [`image`]: the image container.
//! - [`imgproc`]: bilinear warping and panorama composition.

#[doc(inline)]
pub use twoview_geometry as geometry;

#[doc(inline)]
pub use twoview_image as image;

#[doc(inline)]
pub use twoview_imgproc as imgproc;
