use log::debug;
use serde::{Deserialize, Serialize};

use twoview_geometry::linalg::Mat33;
use twoview_image::{Image, ImageError, ImageSize};

use crate::error::ComposeError;
use crate::parallel;
use crate::warp::{inverse_homography, sample_bilinear, transform_point};

/// Axis-aligned bounding box of the panorama, in the frame of image 2.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanvasExtent {
    /// Left edge.
    pub x0: f64,
    /// Top edge.
    pub y0: f64,
    /// Right edge.
    pub x1: f64,
    /// Bottom edge.
    pub y1: f64,
}

impl CanvasExtent {
    /// The rectangle `[0, width] x [0, height]` of an image.
    pub fn from_size(size: ImageSize) -> Self {
        Self {
            x0: 0.0,
            y0: 0.0,
            x1: size.width as f64,
            y1: size.height as f64,
        }
    }

    /// Grow the extent so that it contains `(x, y)`.
    pub fn grow_to(&mut self, x: f64, y: f64) {
        self.x0 = self.x0.min(x);
        self.y0 = self.y0.min(y);
        self.x1 = self.x1.max(x);
        self.y1 = self.y1.max(y);
    }

    /// Whether `(x, y)` lies in the closed rectangle.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x0 && x <= self.x1 && y >= self.y0 && y <= self.y1
    }

    /// Top-left corner, the offset of canvas pixel `(0, 0)`.
    pub fn origin(&self) -> [f64; 2] {
        [self.x0, self.y0]
    }

    /// Canvas size in pixels, the rounded width and height of the extent.
    ///
    /// `None` if a side is not finite or does not fit in `usize`.
    pub fn size(&self) -> Option<ImageSize> {
        Some(ImageSize {
            width: side_in_pixels(self.x1 - self.x0)?,
            height: side_in_pixels(self.y1 - self.y0)?,
        })
    }
}

fn side_in_pixels(len: f64) -> Option<usize> {
    let len = len.round();
    // `usize::MAX as f64` rounds up to a power of two, hence the strict bound
    (len.is_finite() && len >= 0.0 && len < usize::MAX as f64).then_some(len as usize)
}

/// How to combine the two images where they overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    /// Per-channel arithmetic mean.
    #[default]
    Average,
    /// Keep the warped image 1.
    First,
    /// Keep image 2.
    Second,
}

impl BlendMode {
    fn blend<const C: usize>(&self, first: [f32; C], second: [f32; C]) -> [f32; C] {
        match self {
            BlendMode::Average => {
                let mut out = [0.0; C];
                for k in 0..C {
                    out[k] = 0.5 * (first[k] + second[k]);
                }
                out
            }
            BlendMode::First => first,
            BlendMode::Second => second,
        }
    }
}

/// Parameters of [`compose_panorama`].
///
/// Missing fields take their default when deserialized.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(
    default,
    bound(
        serialize = "[f32; C]: Serialize",
        deserialize = "[f32; C]: Deserialize<'de>"
    )
)]
pub struct ComposeParams<const C: usize> {
    /// Overlap policy.
    pub blend: BlendMode,
    /// Value of canvas pixels covered by neither image.
    pub background: [f32; C],
    /// Reject canvases with more pixels than this. Canvases whose buffer cannot be addressed
    /// are always rejected.
    pub max_canvas_pixels: Option<usize>,
}

impl<const C: usize> Default for ComposeParams<C> {
    fn default() -> Self {
        Self {
            blend: BlendMode::default(),
            background: [0.0; C],
            max_canvas_pixels: None,
        }
    }
}

/// A composed panorama.
#[derive(Clone, Debug)]
pub struct Panorama<const C: usize> {
    /// The composed image.
    pub image: Image<f32, C>,
    /// Position of pixel `(0, 0)` in the frame of image 2.
    pub origin: [f64; 2],
    /// Extent covered by the canvas in the frame of image 2.
    pub extent: CanvasExtent,
}

impl<const C: usize> Panorama<C> {
    /// Map a point of image 2 to canvas pixel coordinates.
    pub fn to_canvas(&self, x: f64, y: f64) -> [f64; 2] {
        [x - self.origin[0], y - self.origin[1]]
    }
}

/// Extent covering image 2 and the four corners of image 1 mapped by `h`.
///
/// # Errors
///
/// [`ComposeError::NonFiniteCorner`] if a corner of image 1 maps to infinity.
pub fn canvas_extent(
    size1: ImageSize,
    size2: ImageSize,
    h: &Mat33,
) -> Result<CanvasExtent, ComposeError> {
    let mut extent = CanvasExtent::from_size(size2);
    let (w, hgt) = (size1.width as f64, size1.height as f64);
    for (x, y) in [(0.0, 0.0), (w, 0.0), (w, hgt), (0.0, hgt)] {
        let (u, v) = transform_point(x, y, h).ok_or(ComposeError::NonFiniteCorner { x, y })?;
        extent.grow_to(u, v);
    }
    Ok(extent)
}

/// Stitch two images into a panorama in the frame of image 2.
///
/// `h` maps image 1 into image 2. The canvas covers image 2 and the warped corners of image 1.
/// Every canvas pixel is translated into the frame of image 2 by the canvas origin. Image 2 is
/// sampled there directly, image 1 through the inverse of `h`, both bilinearly and only inside
/// their bounds. Where both exist they are combined with [`ComposeParams::blend`], and pixels
/// covered by neither keep [`ComposeParams::background`].
///
/// # Errors
///
/// * [`ComposeError::Image`] if one of the images has no pixels.
/// * [`ComposeError::SingularTransform`] if `h` cannot be inverted.
/// * [`ComposeError::NonFiniteCorner`] if a corner of image 1 maps to infinity.
/// * [`ComposeError::CanvasTooLarge`] if the canvas exceeds
///   [`ComposeParams::max_canvas_pixels`] or is too large to allocate at all. In the latter
///   case without a limit, `max_pixels` is reported as `usize::MAX`.
///
/// # Example
///
/// ```
/// use twoview_image::{Image, ImageSize};
/// use twoview_imgproc::{compose_panorama, ComposeParams};
///
/// let size = ImageSize { width: 100, height: 100 };
/// let img1 = Image::<f32, 3>::from_size_val(size, 1.0).unwrap();
/// let img2 = Image::<f32, 3>::from_size_val(size, 3.0).unwrap();
/// let h = [[1.0, 0.0, 10.0], [0.0, 1.0, 5.0], [0.0, 0.0, 1.0]];
///
/// let pano = compose_panorama(&img1, &img2, &h, &ComposeParams::default()).unwrap();
/// assert_eq!(pano.image.width(), 110);
/// assert_eq!(pano.image.height(), 105);
/// ```
pub fn compose_panorama<const C: usize>(
    img1: &Image<f32, C>,
    img2: &Image<f32, C>,
    h: &Mat33,
    params: &ComposeParams<C>,
) -> Result<Panorama<C>, ComposeError> {
    for img in [img1, img2] {
        if img.is_empty() {
            return Err(ImageError::InvalidImageSize(img.width(), img.height()).into());
        }
    }

    let h_inv = inverse_homography(h)?;
    let extent = canvas_extent(img1.size(), img2.size(), h)?;
    let max_pixels = params.max_canvas_pixels.unwrap_or(usize::MAX);
    let size = extent
        .size()
        .filter(|size| {
            size.checked_area()
                .filter(|area| area.checked_mul(C).is_some())
                .is_some_and(|area| area <= max_pixels)
        })
        .ok_or(ComposeError::CanvasTooLarge {
            // saturating casts, only reported
            width: (extent.x1 - extent.x0).round() as usize,
            height: (extent.y1 - extent.y0).round() as usize,
            max_pixels,
        })?;

    debug!(
        "compose: extent [{:.2}, {:.2}] x [{:.2}, {:.2}], canvas {}",
        extent.x0, extent.x1, extent.y0, extent.y1, size
    );

    let mut image = Image::from_size_val(size, 0.0f32)?;
    let [x0, y0] = extent.origin();

    parallel::par_fill_pixels(&mut image, |i, j| {
        let (x, y) = (x0 + i as f64, y0 + j as f64);

        let second = sample_bilinear(img2, x, y);
        let first = transform_point(x, y, &h_inv).and_then(|(u, v)| sample_bilinear(img1, u, v));

        match (first, second) {
            (Some(a), Some(b)) => params.blend.blend(a, b),
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => params.background,
        }
    });

    Ok(Panorama {
        image,
        origin: extent.origin(),
        extent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn constant(width: usize, height: usize, val: f32) -> Result<Image<f32, 1>, ComposeError> {
        Ok(Image::from_size_val(ImageSize { width, height }, val)?)
    }

    const SHIFT: Mat33 = [[1.0, 0.0, 10.0], [0.0, 1.0, 5.0], [0.0, 0.0, 1.0]];

    #[test]
    fn extent_grow_and_contains() {
        let mut extent = CanvasExtent::from_size(ImageSize {
            width: 4,
            height: 3,
        });
        assert!(extent.contains(4.0, 3.0));
        assert!(!extent.contains(-1.0, 0.0));
        extent.grow_to(-1.5, 7.0);
        assert!(extent.contains(-1.0, 0.0));
        assert_eq!(extent.origin(), [-1.5, 0.0]);
        assert_eq!(
            extent.size(),
            Some(ImageSize {
                width: 6,
                height: 7
            })
        );
    }

    #[test]
    fn extent_size_out_of_range() {
        let mut extent = CanvasExtent::from_size(ImageSize {
            width: 4,
            height: 3,
        });
        extent.grow_to(1e30, 0.0);
        assert_eq!(extent.size(), None);
        extent.x1 = f64::INFINITY;
        assert_eq!(extent.size(), None);
        extent.x1 = 4.0;
        extent.y0 = f64::NAN;
        assert_eq!(extent.size(), None);
    }

    #[test]
    fn translation_extent() -> Result<(), ComposeError> {
        let size = ImageSize {
            width: 100,
            height: 100,
        };
        let extent = canvas_extent(size, size, &SHIFT)?;
        assert_eq!(
            extent,
            CanvasExtent {
                x0: 0.0,
                y0: 0.0,
                x1: 110.0,
                y1: 105.0
            }
        );
        Ok(())
    }

    #[test]
    fn extent_contains_warped_corners() -> Result<(), ComposeError> {
        let h = [[0.9, 0.1, -40.0], [-0.05, 1.05, 30.0], [2e-4, 1e-4, 1.0]];
        let size1 = ImageSize {
            width: 320,
            height: 240,
        };
        let size2 = ImageSize {
            width: 200,
            height: 260,
        };
        let extent = canvas_extent(size1, size2, &h)?;
        for (x, y) in [(0.0, 0.0), (320.0, 0.0), (320.0, 240.0), (0.0, 240.0)] {
            let (u, v) = transform_point(x, y, &h).ok_or(ComposeError::SingularTransform)?;
            assert!(extent.contains(u, v));
        }
        assert!(extent.contains(0.0, 0.0));
        assert!(extent.contains(200.0, 260.0));
        Ok(())
    }

    #[test]
    fn compose_translation_average() -> Result<(), ComposeError> {
        let img1 = constant(100, 100, 1.0)?;
        let img2 = constant(100, 100, 3.0)?;
        let params = ComposeParams {
            background: [-1.0],
            ..Default::default()
        };
        let pano = compose_panorama(&img1, &img2, &SHIFT, &params)?;

        assert_eq!(pano.origin, [0.0, 0.0]);
        assert_eq!(pano.image.width(), 110);
        assert_eq!(pano.image.height(), 105);
        // overlap
        assert_relative_eq!(pano.image.get_pixel(50, 50, 0)?, 2.0);
        // image 1 only
        assert_relative_eq!(pano.image.get_pixel(105, 100, 0)?, 1.0);
        // image 2 only
        assert_relative_eq!(pano.image.get_pixel(5, 2, 0)?, 3.0);
        // neither
        assert_relative_eq!(pano.image.get_pixel(2, 102, 0)?, -1.0);
        Ok(())
    }

    #[test]
    fn compose_blend_modes() -> Result<(), ComposeError> {
        let img1 = constant(20, 20, 1.0)?;
        let img2 = constant(20, 20, 3.0)?;
        for (blend, expected) in [(BlendMode::First, 1.0), (BlendMode::Second, 3.0)] {
            let params = ComposeParams {
                blend,
                ..Default::default()
            };
            let pano = compose_panorama(&img1, &img2, &SHIFT, &params)?;
            assert_relative_eq!(pano.image.get_pixel(15, 15, 0)?, expected);
        }
        Ok(())
    }

    #[test]
    fn compose_negative_origin() -> Result<(), ComposeError> {
        let img1 = constant(30, 20, 1.0)?;
        let img2 = constant(30, 20, 3.0)?;
        let h = [[1.0, 0.0, -12.0], [0.0, 1.0, -4.0], [0.0, 0.0, 1.0]];
        let pano = compose_panorama(&img1, &img2, &h, &ComposeParams::default())?;
        assert_eq!(pano.origin, [-12.0, -4.0]);
        assert_eq!(pano.image.width(), 42);
        assert_eq!(pano.image.height(), 24);
        assert_eq!(pano.to_canvas(0.0, 0.0), [12.0, 4.0]);
        // top-left canvas pixel only sees image 1
        assert_relative_eq!(pano.image.get_pixel(0, 0, 0)?, 1.0);
        Ok(())
    }

    #[test]
    fn compose_singular_homography() -> Result<(), ComposeError> {
        let img = constant(10, 10, 1.0)?;
        let h = [[1.0, 2.0, 0.0], [2.0, 4.0, 0.0], [0.0, 0.0, 1.0]];
        let res = compose_panorama(&img, &img, &h, &ComposeParams::default());
        assert_eq!(res.err(), Some(ComposeError::SingularTransform));
        Ok(())
    }

    #[test]
    fn compose_corner_at_infinity() -> Result<(), ComposeError> {
        let img = constant(100, 10, 1.0)?;
        let h = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-0.01, 0.0, 1.0]];
        let res = compose_panorama(&img, &img, &h, &ComposeParams::default());
        assert_eq!(
            res.err(),
            Some(ComposeError::NonFiniteCorner { x: 100.0, y: 0.0 })
        );
        Ok(())
    }

    #[test]
    fn compose_corner_near_infinity() -> Result<(), ComposeError> {
        // well conditioned, but a corner of image 1 lands ~1e13 px away
        let img = constant(100, 100, 1.0)?;
        let h = [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [-0.0099999999999, 0.0, 1.0]];

        let params = ComposeParams {
            max_canvas_pixels: Some(1 << 20),
            ..Default::default()
        };
        match compose_panorama(&img, &img, &h, &params) {
            Err(ComposeError::CanvasTooLarge {
                width,
                height,
                max_pixels,
            }) => {
                assert!(width > 1 << 40 && height > 1 << 40);
                assert_eq!(max_pixels, 1 << 20);
            }
            other => panic!("unexpected result {:?}", other.map(|p| p.image.size())),
        }

        // no limit, the pixel count alone overflows
        let res = compose_panorama(&img, &img, &h, &ComposeParams::default());
        assert!(matches!(
            res,
            Err(ComposeError::CanvasTooLarge {
                max_pixels: usize::MAX,
                ..
            })
        ));
        Ok(())
    }

    #[test]
    fn compose_params_from_json() -> Result<(), serde_json::Error> {
        let params: ComposeParams<3> =
            serde_json::from_str(r#"{"blend": "First", "background": [0.5, 0.25, 1.0]}"#)?;
        assert_eq!(params.blend, BlendMode::First);
        assert_eq!(params.background, [0.5, 0.25, 1.0]);
        assert_eq!(params.max_canvas_pixels, None);

        let json = serde_json::to_string(&params)?;
        assert_eq!(serde_json::from_str::<ComposeParams<3>>(&json)?, params);

        // background length must match the channel count
        assert!(serde_json::from_str::<ComposeParams<3>>(r#"{"background": [1.0]}"#).is_err());
        Ok(())
    }

    #[test]
    fn compose_empty_image() -> Result<(), ComposeError> {
        let img = constant(10, 10, 1.0)?;
        let empty = constant(0, 10, 1.0)?;
        let res = compose_panorama(&empty, &img, &SHIFT, &ComposeParams::default());
        assert_eq!(
            res.err(),
            Some(ComposeError::Image(ImageError::InvalidImageSize(0, 10)))
        );
        Ok(())
    }

    #[test]
    fn compose_canvas_too_large() -> Result<(), ComposeError> {
        let img = constant(100, 100, 1.0)?;
        let params = ComposeParams {
            max_canvas_pixels: Some(100 * 100),
            ..Default::default()
        };
        let res = compose_panorama(&img, &img, &SHIFT, &params);
        assert_eq!(
            res.err(),
            Some(ComposeError::CanvasTooLarge {
                width: 110,
                height: 105,
                max_pixels: 10_000
            })
        );
        Ok(())
    }
}
