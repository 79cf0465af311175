use approx::assert_relative_eq;

use twoview_geometry::model::homography_dlt;
use twoview_geometry::Correspondence;
use twoview_image::{Image, ImageSize};
use twoview_imgproc::compose::canvas_extent;
use twoview_imgproc::{compose_panorama, BlendMode, ComposeParams};

fn gradient(size: ImageSize, offset: [f32; 2]) -> Result<Image<f32, 3>, Box<dyn std::error::Error>> {
    Ok(Image::from_fn(size, |x, y| {
        let (u, v) = (x as f32 + offset[0], y as f32 + offset[1]);
        [u, v, 0.5 * (u + v)]
    })?)
}

#[test]
fn stitch_translated_pair() -> Result<(), Box<dyn std::error::Error>> {
    let size = ImageSize {
        width: 100,
        height: 100,
    };
    // image 2 sees the scene shifted by (10, 5)
    let img1 = gradient(size, [0.0, 0.0])?;
    let img2 = gradient(size, [-10.0, -5.0])?;

    let corrs = [[5.0, 5.0], [90.0, 8.0], [88.0, 93.0], [7.0, 80.0]]
        .iter()
        .map(|p| Correspondence::from_points(*p, [p[0] + 10.0, p[1] + 5.0]))
        .collect::<Vec<_>>();
    let h = homography_dlt(&corrs)?;
    for (row, expected) in h.iter().zip([[1.0, 0.0, 10.0], [0.0, 1.0, 5.0], [0.0, 0.0, 1.0]]) {
        for (v, e) in row.iter().zip(expected) {
            assert_relative_eq!(*v, e, epsilon = 1e-9);
        }
    }

    let extent = canvas_extent(size, size, &h)?;
    assert_relative_eq!(extent.x0, 0.0, epsilon = 1e-9);
    assert_relative_eq!(extent.y0, 0.0, epsilon = 1e-9);
    assert_relative_eq!(extent.x1, 110.0, epsilon = 1e-9);
    assert_relative_eq!(extent.y1, 105.0, epsilon = 1e-9);

    let params = ComposeParams {
        blend: BlendMode::Average,
        background: [-1.0; 3],
        max_canvas_pixels: Some(1 << 20),
    };
    let pano = compose_panorama(&img1, &img2, &h, &params)?;
    assert_eq!(pano.image.size(), ImageSize { width: 110, height: 105 });

    // both images agree on the scene, so the overlap reproduces it
    for &(x, y) in &[(20usize, 30usize), (60, 60), (99, 99)] {
        let expected = [x as f32 - 10.0, y as f32 - 5.0];
        assert_relative_eq!(pano.image.get_pixel(x, y, 0)?, expected[0], epsilon = 1e-3);
        assert_relative_eq!(pano.image.get_pixel(x, y, 1)?, expected[1], epsilon = 1e-3);
    }
    assert_relative_eq!(pano.image.get_pixel(105, 50, 0)?, 95.0, epsilon = 1e-3);
    assert_eq!(pano.image.get_pixel(3, 103, 2)?, -1.0);

    assert_eq!(pano.origin, [extent.x0, extent.y0]);
    Ok(())
}
