use argh::FromArgs;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::path::PathBuf;

use twoview::geometry::epipolar::{epipolar_segment, EpipolarSegment, SideBySide};
use twoview::geometry::linalg::{self, Mat33};
use twoview::geometry::{Correspondence, FundamentalEstimator, Normalization, Ransac, RansacParams};

#[derive(FromArgs)]
/// Estimate the fundamental matrix of a synthetic stereo pair and query epipolar lines
struct Args {
    /// seed of the random generator
    #[argh(option, default = "0")]
    seed: u64,

    /// number of projected scene points
    #[argh(option, default = "60")]
    points: usize,

    /// fraction of correspondences replaced by random matches
    #[argh(option, default = "0.3")]
    outlier_ratio: f64,

    /// normalize coordinates by a fixed factor instead of the isotropic transform
    #[argh(option)]
    scale: Option<f64>,

    /// path to a json file with the RANSAC parameters
    #[argh(option)]
    params: Option<PathBuf>,

    /// path to write the queried segments as json
    #[argh(option)]
    report: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report {
    fundamental: Mat33,
    inliers: usize,
    segments: Vec<EpipolarSegment>,
}

const WIDTH: f64 = 640.0;
const HEIGHT: f64 = 480.0;

fn project(k: &Mat33, p: &[f64; 3]) -> [f64; 2] {
    let q = linalg::mat33_mul_vec3(k, p);
    [q[0] / q[2], q[1] / q[2]]
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let args: Args = argh::from_env();

    let params: RansacParams = match &args.params {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => RansacParams::default(),
    };

    // two pinhole cameras with a horizontal baseline and a small rotation
    let k = [[500.0, 0.0, 320.0], [0.0, 500.0, 240.0], [0.0, 0.0, 1.0]];
    let (c, s) = (0.08f64.cos(), 0.08f64.sin());
    let r = [[c, 0.0, s], [0.0, 1.0, 0.0], [-s, 0.0, c]];
    let t = [-0.8, 0.05, 0.1];

    let mut rng = StdRng::seed_from_u64(args.seed);
    let corrs = (0..args.points)
        .map(|_| {
            let x = [
                rng.random_range(-2.5..2.5),
                rng.random_range(-1.8..1.8),
                rng.random_range(5.0..12.0),
            ];
            let xc = linalg::mat33_mul_vec3(&r, &x);
            let p1 = project(&k, &x);
            let p2 = if rng.random_bool(args.outlier_ratio.clamp(0.0, 1.0)) {
                [rng.random_range(0.0..WIDTH), rng.random_range(0.0..HEIGHT)]
            } else {
                project(&k, &[xc[0] + t[0], xc[1] + t[1], xc[2] + t[2]])
            };
            Correspondence::from_points(p1, p2)
        })
        .collect::<Vec<_>>();

    let normalization = match args.scale {
        Some(scale) => Normalization::Scale(scale),
        None => Normalization::Isotropic,
    };
    let ransac = Ransac::new(FundamentalEstimator::new(normalization), params);
    let report = ransac.fit(&corrs, &mut rng)?;
    let f = report.model;

    println!(
        "RANSAC: {} / {} inliers after {} iterations, rmse {:.4} px",
        report.inlier_count(),
        corrs.len(),
        report.iterations,
        report.rmse
    );
    for row in f.iter() {
        println!("  [{:>12.4e} {:>12.4e} {:>12.4e}]", row[0], row[1], row[2]);
    }

    // click on the first inliers, alternating between the two images
    let layout = SideBySide::new([WIDTH as usize, HEIGHT as usize], [WIDTH as usize, HEIGHT as usize]);
    let mut segments = Vec::new();
    for (n, &i) in report.inliers.iter().take(6).enumerate() {
        let c = &corrs[i];
        let (screen, target) = if n % 2 == 0 {
            (c.p1(), [c.x2 + WIDTH, c.y2])
        } else {
            ([c.x2 + WIDTH, c.y2], c.p1())
        };
        match epipolar_segment(&f, &layout, screen) {
            Some(seg) => {
                println!(
                    "({:7.1}, {:7.1}) -> {:?} line from ({:7.1}, {:7.1}) to ({:7.1}, {:7.1}), match at ({:7.1}, {:7.1})",
                    screen[0],
                    screen[1],
                    seg.view,
                    seg.screen_endpoints[0][0],
                    seg.screen_endpoints[0][1],
                    seg.screen_endpoints[1][0],
                    seg.screen_endpoints[1][1],
                    target[0],
                    target[1],
                );
                segments.push(seg);
            }
            None => log::warn!("no epipolar line for ({:.1}, {:.1})", screen[0], screen[1]),
        }
    }

    if let Some(path) = &args.report {
        let out = Report {
            fundamental: f,
            inliers: report.inlier_count(),
            segments,
        };
        std::fs::write(path, serde_json::to_string_pretty(&out)?)?;
        log::info!("report written to {}", path.display());
    }

    Ok(())
}
