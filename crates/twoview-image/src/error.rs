/// An error type for the image module.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum ImageError {
    /// Error when channel and shape are not valid.
    #[error("Data length ({0}) does not match the image size ({1})")]
    InvalidChannelShape(usize, usize),

    /// Error when the pixel coordinates are out of bounds.
    #[error("Pixel coordinates ({0}, {1}) are out of bounds ({2}, {3})")]
    PixelIndexOutOfBounds(usize, usize, usize, usize),

    /// Error when the image has no pixels, or more than a buffer can address.
    #[error("Invalid image size ({0}, {1})")]
    InvalidImageSize(usize, usize),
}
