use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use twoview::geometry::linalg::{self, Mat33};
use twoview::geometry::{fit_model, Correspondence, ModelKind, RansacParams};
use twoview::image::{Image, ImageSize};
use twoview::imgproc::{compose_panorama, ComposeParams};

#[derive(FromArgs)]
/// Stitch two synthetic views of a scene with a RANSAC homography
struct Args {
    /// seed of the random generator
    #[argh(option, default = "0")]
    seed: u64,

    /// number of correct correspondences
    #[argh(option, default = "40")]
    inliers: usize,

    /// number of wrong correspondences
    #[argh(option, default = "60")]
    outliers: usize,

    /// path to a json file with the stitching parameters
    #[argh(option)]
    params: Option<PathBuf>,

    /// path to write a json report of the run
    #[argh(option)]
    report: Option<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct StitchParams {
    ransac: RansacParams,
    compose: ComposeParams<3>,
}

#[derive(Serialize)]
struct Report {
    homography: Mat33,
    inliers: usize,
    iterations: usize,
    rmse: f64,
    canvas: [usize; 2],
    origin: [f64; 2],
}

const IMAGE_SIZE: ImageSize = ImageSize {
    width: 320,
    height: 240,
};

// smooth color pattern defined over the frame of image 2
fn scene(x: f64, y: f64) -> [f32; 3] {
    [
        (0.5 + 0.5 * (x * 0.05).sin() * (y * 0.03).cos()) as f32,
        (0.5 + 0.5 * ((x + y) * 0.02).sin()) as f32,
        (0.5 + 0.5 * (y * 0.07).cos()) as f32,
    ]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let params: StitchParams = match &args.params {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => StitchParams::default(),
    };
    log::debug!("params: {:?}", params);

    // image 1 looks at the scene through the inverse of a mild perspective warp
    let h_true = [
        [0.97, -0.04, 140.0],
        [0.03, 1.01, 18.0],
        [-1.5e-4, 6e-5, 1.0],
    ];
    let img1 = Image::<f32, 3>::from_fn(IMAGE_SIZE, |x, y| {
        linalg::transform_point2(&h_true, &[x as f64, y as f64])
            .map(|p| scene(p[0], p[1]))
            .unwrap_or([0.0; 3])
    })?;
    let img2 = Image::<f32, 3>::from_fn(IMAGE_SIZE, |x, y| scene(x as f64, y as f64))?;

    let mut rng = StdRng::seed_from_u64(args.seed);
    let (w, h) = (IMAGE_SIZE.width as f64, IMAGE_SIZE.height as f64);
    let mut corrs = Vec::with_capacity(args.inliers + args.outliers);
    while corrs.len() < args.inliers {
        let p1 = [rng.random_range(0.0..w), rng.random_range(0.0..h)];
        if let Some(p2) = linalg::transform_point2(&h_true, &p1) {
            corrs.push(Correspondence::from_points(p1, p2));
        }
    }
    for _ in 0..args.outliers {
        let p1 = [rng.random_range(0.0..w), rng.random_range(0.0..h)];
        let p2 = [rng.random_range(0.0..w), rng.random_range(0.0..h)];
        corrs.push(Correspondence::from_points(p1, p2));
    }

    let total = corrs.len();
    let report = fit_model(ModelKind::Homography, &mut corrs, &params.ransac, &mut rng)?;
    let homography = *report.model.matrix();

    println!(
        "RANSAC: {} / {} inliers after {} iterations, rmse {:.4} px",
        report.inlier_count(),
        total,
        report.iterations,
        report.rmse
    );
    for row in homography.iter() {
        println!("  [{:>12.6} {:>12.6} {:>12.6}]", row[0], row[1], row[2]);
    }

    let pano = compose_panorama(&img1, &img2, &homography, &params.compose)?;
    println!(
        "panorama: {}x{} pixels, origin ({:.2}, {:.2}) in the frame of image 2",
        pano.image.width(),
        pano.image.height(),
        pano.origin[0],
        pano.origin[1]
    );

    if let Some(path) = &args.report {
        let report = Report {
            homography,
            inliers: report.inlier_count(),
            iterations: report.iterations,
            rmse: report.rmse,
            canvas: [pano.image.width(), pano.image.height()],
            origin: pano.origin,
        };
        std::fs::write(path, serde_json::to_string_pretty(&report)?)?;
        log::info!("report written to {}", path.display());
    }

    Ok(())
}
