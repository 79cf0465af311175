use crate::error::ImageError;

/// Image size in pixels
///
/// A struct to represent the size of an image in pixels.
///
/// # Examples
///
/// ```
/// use twoview_image::ImageSize;
///
/// let image_size = ImageSize {
///   width: 10,
///   height: 20,
/// };
///
/// assert_eq!(image_size.width, 10);
/// assert_eq!(image_size.height, 20);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    /// Width of the image in pixels
    pub width: usize,
    /// Height of the image in pixels
    pub height: usize,
}

impl ImageSize {
    /// Number of pixels covered by this size.
    ///
    /// Saturates at `usize::MAX`, see [`ImageSize::checked_area`].
    pub fn area(&self) -> usize {
        self.width.saturating_mul(self.height)
    }

    /// Number of pixels covered by this size, or `None` on overflow.
    pub fn checked_area(&self) -> Option<usize> {
        self.width.checked_mul(self.height)
    }
}

impl std::fmt::Display for ImageSize {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "ImageSize {{ width: {}, height: {} }}",
            self.width, self.height
        )
    }
}

impl From<[usize; 2]> for ImageSize {
    fn from(size: [usize; 2]) -> Self {
        ImageSize {
            width: size[0],
            height: size[1],
        }
    }
}

/// Represents an image with pixel data.
///
/// The pixels are stored row-major and interleaved, i.e. with shape (H, W, C), where H is the
/// height of the image, W the width and C the number of channels.
#[derive(Clone, Debug, PartialEq)]
pub struct Image<T, const CHANNELS: usize> {
    size: ImageSize,
    data: Vec<T>,
}

impl<T, const CHANNELS: usize> Image<T, CHANNELS> {
    /// Create a new image from pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `data` - The pixel data of the image.
    ///
    /// # Errors
    ///
    /// If the length of the pixel data does not match the image size, an error is returned.
    /// A size whose buffer length overflows `usize` gives [`ImageError::InvalidImageSize`].
    ///
    /// # Examples
    ///
    /// ```
    /// use twoview_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::new(
    ///    ImageSize {
    ///       width: 10,
    ///       height: 20,
    ///    },
    ///    vec![0u8; 10 * 20 * 3],
    /// ).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.size().height, 20);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn new(size: ImageSize, data: Vec<T>) -> Result<Self, ImageError> {
        // check if the data length matches the image size
        let len = Self::buffer_len(size)?;
        if data.len() != len {
            return Err(ImageError::InvalidChannelShape(data.len(), len));
        }

        Ok(Self { size, data })
    }

    /// Create a new image with the given size and default pixel data.
    ///
    /// # Arguments
    ///
    /// * `size` - The size of the image in pixels.
    /// * `val` - The default value of the pixel data.
    ///
    /// # Examples
    ///
    /// ```
    /// use twoview_image::{Image, ImageSize};
    ///
    /// let image = Image::<u8, 3>::from_size_val(
    ///   ImageSize {
    ///     width: 10,
    ///     height: 20,
    ///   }, 0u8).unwrap();
    ///
    /// assert_eq!(image.size().width, 10);
    /// assert_eq!(image.num_channels(), 3);
    /// ```
    pub fn from_size_val(size: ImageSize, val: T) -> Result<Self, ImageError>
    where
        T: Clone,
    {
        let data = vec![val; Self::buffer_len(size)?];
        Image::new(size, data)
    }

    /// Create a new image by evaluating `f(x, y)` at every pixel.
    ///
    /// Handy to build synthetic test patterns.
    pub fn from_fn(
        size: ImageSize,
        mut f: impl FnMut(usize, usize) -> [T; CHANNELS],
    ) -> Result<Self, ImageError> {
        let mut data = Vec::with_capacity(Self::buffer_len(size)?);
        for y in 0..size.height {
            for x in 0..size.width {
                data.extend(f(x, y));
            }
        }
        Image::new(size, data)
    }

    // number of scalars stored for `size`
    fn buffer_len(size: ImageSize) -> Result<usize, ImageError> {
        size
            .checked_area()
            .and_then(|area| area.checked_mul(CHANNELS))
            .ok_or(ImageError::InvalidImageSize(size.width, size.height))
    }

    /// Get the size of the image in pixels.
    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// Get the number of columns of the image.
    pub fn cols(&self) -> usize {
        self.width()
    }

    /// Get the number of rows of the image.
    pub fn rows(&self) -> usize {
        self.height()
    }

    /// Get the width of the image in pixels.
    pub fn width(&self) -> usize {
        self.size.width
    }

    /// Get the height of the image in pixels.
    pub fn height(&self) -> usize {
        self.size.height
    }

    /// Get the number of channels in the image.
    pub fn num_channels(&self) -> usize {
        CHANNELS
    }

    /// Whether the image holds no pixels at all.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The pixel data as a flat, row-major slice.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// The pixel data as a flat, row-major mutable slice.
    pub fn as_slice_mut(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Get all channels of the pixel at `(x, y)`.
    ///
    /// Returns `None` if the coordinates fall outside the image.
    pub fn pixel(&self, x: usize, y: usize) -> Option<&[T]> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        let base = (y * self.width() + x) * CHANNELS;
        self.data.get(base..base + CHANNELS)
    }

    /// Get the value of a single channel of the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// If the coordinates fall outside the image, an error is returned.
    pub fn get_pixel(&self, x: usize, y: usize, ch: usize) -> Result<T, ImageError>
    where
        T: Copy,
    {
        self.pixel(x, y)
            .and_then(|p| p.get(ch))
            .copied()
            .ok_or(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ))
    }

    /// Set the value of a single channel of the pixel at `(x, y)`.
    ///
    /// # Errors
    ///
    /// If the coordinates fall outside the image, an error is returned.
    pub fn set_pixel(&mut self, x: usize, y: usize, ch: usize, val: T) -> Result<(), ImageError> {
        if x >= self.width() || y >= self.height() || ch >= CHANNELS {
            return Err(ImageError::PixelIndexOutOfBounds(
                x,
                y,
                self.width(),
                self.height(),
            ));
        }
        let idx = (y * self.width() + x) * CHANNELS + ch;
        self.data[idx] = val;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_size() {
        let image_size = ImageSize {
            width: 10,
            height: 20,
        };
        assert_eq!(image_size.area(), 200);
        assert_eq!(ImageSize::from([10, 20]), image_size);
    }

    #[test]
    fn image_smoke() -> Result<(), ImageError> {
        let image = Image::<u8, 3>::new(
            ImageSize {
                width: 10,
                height: 20,
            },
            vec![0u8; 10 * 20 * 3],
        )?;
        assert_eq!(image.size().width, 10);
        assert_eq!(image.size().height, 20);
        assert_eq!(image.num_channels(), 3);
        assert!(!image.is_empty());
        Ok(())
    }

    #[test]
    fn image_wrong_length() {
        let res = Image::<u8, 3>::new(
            ImageSize {
                width: 2,
                height: 2,
            },
            vec![0u8; 5],
        );
        assert_eq!(res, Err(ImageError::InvalidChannelShape(5, 12)));
    }

    #[test]
    fn image_size_overflow() {
        let size = ImageSize {
            width: usize::MAX / 2,
            height: 3,
        };
        assert_eq!(size.checked_area(), None);
        assert_eq!(size.area(), usize::MAX);

        // the pixel count fits, the scalar count does not
        let size = ImageSize {
            width: usize::MAX / 4,
            height: 2,
        };
        assert!(size.checked_area().is_some());
        let err = ImageError::InvalidImageSize(usize::MAX / 4, 2);
        assert_eq!(Image::<f32, 3>::from_size_val(size, 0.0), Err(err.clone()));
        assert_eq!(Image::<f32, 3>::new(size, vec![]), Err(err));
    }

    #[test]
    fn image_from_fn_and_access() -> Result<(), ImageError> {
        let image = Image::<u8, 2>::from_fn(
            ImageSize {
                width: 3,
                height: 2,
            },
            |x, y| [x as u8, y as u8],
        )?;
        assert_eq!(image.pixel(2, 1), Some(&[2u8, 1u8][..]));
        assert_eq!(image.get_pixel(1, 0, 0)?, 1);
        assert_eq!(image.pixel(3, 0), None);
        assert_eq!(
            image.get_pixel(0, 2, 0),
            Err(ImageError::PixelIndexOutOfBounds(0, 2, 3, 2))
        );
        Ok(())
    }

    #[test]
    fn image_set_pixel() -> Result<(), ImageError> {
        let mut image = Image::<f32, 1>::from_size_val(
            ImageSize {
                width: 2,
                height: 2,
            },
            0.0,
        )?;
        image.set_pixel(1, 1, 0, 5.0)?;
        assert_eq!(image.as_slice(), &[0.0, 0.0, 0.0, 5.0]);
        assert!(image.set_pixel(2, 0, 0, 1.0).is_err());
        Ok(())
    }
}
