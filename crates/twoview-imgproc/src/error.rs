use twoview_image::ImageError;

/// Errors returned by the warping and composition operations.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ComposeError {
    /// The homography is singular and cannot be inverted.
    #[error("Homography is singular and cannot be inverted")]
    SingularTransform,

    /// A corner of the warped image maps to infinity or to a non-finite point.
    #[error("Corner ({x}, {y}) does not map to a finite point")]
    NonFiniteCorner {
        /// Corner abscissa in the source image.
        x: f64,
        /// Corner ordinate in the source image.
        y: f64,
    },

    /// The canvas exceeds the configured maximum number of pixels.
    #[error("Canvas of {width}x{height} pixels exceeds the limit of {max_pixels} pixels")]
    CanvasTooLarge {
        /// Canvas width in pixels.
        width: usize,
        /// Canvas height in pixels.
        height: usize,
        /// Configured limit.
        max_pixels: usize,
    },

    /// Error from the image container.
    #[error(transparent)]
    Image(#[from] ImageError),
}
