//! RANSAC-based robust fitting of two-view models.

use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::correspondence::{self, Correspondence};
use crate::error::GeometryError;
use crate::model::{
    homography_residuals, Estimator, FundamentalEstimator, GeometricModel, HomographyEstimator,
    ModelKind,
};

/// Source of random sample indices for RANSAC.
///
/// Every [`rand::Rng`] is a `RandomSource`, so a seeded `StdRng` gives reproducible runs.
pub trait RandomSource {
    /// Draw an index uniformly from `0..upper`. `upper` is never zero.
    fn next_index(&mut self, upper: usize) -> usize;
}

impl<R: rand::Rng + ?Sized> RandomSource for R {
    fn next_index(&mut self, upper: usize) -> usize {
        self.random_range(0..upper)
    }
}

/// Parameters for RANSAC model estimation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RansacParams {
    /// Inlier threshold on the model distance, in pixels.
    pub threshold: f64,
    /// Accepted probability that no outlier-free sample is ever drawn.
    pub failure_probability: f64,
    /// Initial (and maximal) number of iterations.
    pub max_iterations: usize,
    /// Whether to refit the model on the whole best consensus set.
    pub refine: bool,
}

impl Default for RansacParams {
    fn default() -> Self {
        Self {
            threshold: 1.5,
            failure_probability: 0.01,
            max_iterations: 100_000,
            refine: true,
        }
    }
}

impl RansacParams {
    /// Check that every parameter is in its valid range.
    pub fn validate(&self) -> Result<(), GeometryError> {
        if !(self.threshold.is_finite() && self.threshold > 0.0) {
            return Err(GeometryError::InvalidParameter(format!(
                "threshold must be positive, got {}",
                self.threshold
            )));
        }
        if !(self.failure_probability > 0.0 && self.failure_probability < 1.0) {
            return Err(GeometryError::InvalidParameter(format!(
                "failure probability must be in (0, 1), got {}",
                self.failure_probability
            )));
        }
        if self.max_iterations == 0 {
            return Err(GeometryError::InvalidParameter(
                "max_iterations must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// A change of the iteration budget during a RANSAC run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BudgetUpdate {
    /// Iterations executed when the budget was recomputed.
    pub iteration: usize,
    /// The budget from then on.
    pub budget: usize,
}

/// Result of a RANSAC model fit.
#[derive(Clone, Debug)]
pub struct RansacReport<M> {
    /// Estimated model.
    pub model: M,
    /// Indices of the inliers in the input correspondences, in increasing order.
    pub inliers: Vec<usize>,
    /// Total number of iterations executed, degenerate samples included.
    pub iterations: usize,
    /// Budget after each improvement of the best model, starting with the initial budget.
    pub budget_history: Vec<BudgetUpdate>,
    /// Root mean square distance of the inliers to the returned model.
    pub rmse: f64,
}

impl<M> RansacReport<M> {
    /// Number of inliers of the best consensus set.
    pub fn inlier_count(&self) -> usize {
        self.inliers.len()
    }

    /// Convert the model, keeping the rest of the report.
    pub fn map<N>(self, f: impl FnOnce(M) -> N) -> RansacReport<N> {
        RansacReport {
            model: f(self.model),
            inliers: self.inliers,
            iterations: self.iterations,
            budget_history: self.budget_history,
            rmse: self.rmse,
        }
    }
}

/// Number of iterations needed to draw at least one outlier-free sample with probability
/// `1 - failure_probability`.
///
/// Computes `log(β) / log(1 - w^s)` with `w = inliers / total` and `s = sample_size`, rounded
/// up. Returns `0` when every correspondence is an inlier and `usize::MAX` when the estimate
/// is unbounded.
///
/// # Example
///
/// ```
/// use twoview_geometry::ransac::required_iterations;
///
/// assert_eq!(required_iterations(50, 100, 4, 0.01), 72);
/// assert_eq!(required_iterations(100, 100, 4, 0.01), 0);
/// ```
pub fn required_iterations(
    inliers: usize,
    total: usize,
    sample_size: usize,
    failure_probability: f64,
) -> usize {
    if total == 0 || inliers == 0 {
        return usize::MAX;
    }
    let w = inliers as f64 / total as f64;
    let ws = w.powi(sample_size as i32);
    if ws >= 1.0 {
        return 0;
    }
    let denom = (-ws).ln_1p();
    if denom >= 0.0 || !denom.is_finite() {
        return usize::MAX;
    }
    let n = (failure_probability.ln() / denom).ceil();
    if n.is_finite() && n >= 0.0 && n < usize::MAX as f64 {
        n as usize
    } else {
        usize::MAX
    }
}

/// Robust fitter: samples minimal subsets, scores candidates against all correspondences and
/// keeps the model with the largest consensus set.
///
/// The iteration budget starts at [`RansacParams::max_iterations`] and shrinks after every
/// improvement following [`required_iterations`]. It never grows and never falls below the
/// number of iterations already executed. On ties the earliest model wins.
///
/// # Example
///
/// ```
/// use rand::{rngs::StdRng, SeedableRng};
/// use twoview_geometry::{Correspondence, HomographyEstimator, Ransac, RansacParams};
///
/// let corrs = (0..20)
///     .map(|i| {
///         let (x, y) = ((i % 5) as f64 * 20.0, (i / 5) as f64 * 30.0 + (i % 3) as f64);
///         Correspondence::new(x, y, x + 10.0, y + 5.0)
///     })
///     .collect::<Vec<_>>();
///
/// let ransac = Ransac::new(HomographyEstimator, RansacParams::default());
/// let report = ransac.fit(&corrs, &mut StdRng::seed_from_u64(0)).unwrap();
/// assert_eq!(report.inlier_count(), 20);
/// ```
#[derive(Clone, Debug)]
pub struct Ransac<E> {
    estimator: E,
    params: RansacParams,
}

impl<E: Estimator> Ransac<E> {
    /// Create a new robust fitter around `estimator`.
    pub fn new(estimator: E, params: RansacParams) -> Self {
        Self { estimator, params }
    }

    /// The parameters of this fitter.
    pub fn params(&self) -> &RansacParams {
        &self.params
    }

    /// The wrapped estimator.
    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// Indices of the correspondences within the inlier threshold of `model`.
    pub fn consensus_set(&self, model: &E::Model, correspondences: &[Correspondence]) -> Vec<usize> {
        let mut inliers = Vec::new();
        self.collect_inliers(model, correspondences, &mut inliers);
        inliers
    }

    fn collect_inliers(
        &self,
        model: &E::Model,
        correspondences: &[Correspondence],
        inliers: &mut Vec<usize>,
    ) {
        inliers.clear();
        inliers.extend(
            correspondences
                .iter()
                .enumerate()
                .filter(|(_, c)| self.estimator.distance(model, c) <= self.params.threshold)
                .map(|(i, _)| i),
        );
    }

    /// Run RANSAC over `correspondences` without modifying them.
    ///
    /// # Errors
    ///
    /// * [`GeometryError::InvalidParameter`] if the parameters are out of range.
    /// * [`GeometryError::InsufficientCorrespondences`] with fewer correspondences than the
    ///   minimal sample size.
    /// * [`GeometryError::NoConsensusFound`] if no model reached the minimal sample size in
    ///   inliers within the iteration budget.
    pub fn fit<R: RandomSource + ?Sized>(
        &self,
        correspondences: &[Correspondence],
        rng: &mut R,
    ) -> Result<RansacReport<E::Model>, GeometryError> {
        self.params.validate()?;

        let n = correspondences.len();
        let sample_size = self.estimator.sample_size();
        if n < sample_size {
            return Err(GeometryError::InsufficientCorrespondences {
                required: sample_size,
                actual: n,
            });
        }

        debug!(
            "ransac: {} correspondences, sample size {}, threshold {}",
            n, sample_size, self.params.threshold
        );

        let mut budget = self.params.max_iterations;
        let mut budget_history = vec![BudgetUpdate {
            iteration: 0,
            budget,
        }];

        let mut sample = Vec::with_capacity(sample_size);
        let mut scratch = Vec::with_capacity(n);
        let mut best_inliers = Vec::with_capacity(n);
        let mut best_model = None;
        let mut iteration = 0usize;

        while iteration < budget {
            iteration += 1;

            // uniform sampling with replacement, duplicates are rejected by the estimator
            sample.clear();
            for _ in 0..sample_size {
                sample.push(correspondences[rng.next_index(n)]);
            }

            let model = match self.estimator.estimate(&sample) {
                Ok(model) => model,
                Err(err) => {
                    trace!("ransac: iteration {} skipped: {}", iteration, err);
                    continue;
                }
            };

            self.collect_inliers(&model, correspondences, &mut scratch);
            if scratch.len() <= best_inliers.len() {
                continue;
            }

            std::mem::swap(&mut best_inliers, &mut scratch);
            best_model = Some(model);

            let required = required_iterations(
                best_inliers.len(),
                n,
                sample_size,
                self.params.failure_probability,
            );
            budget = required.max(iteration).min(budget);
            budget_history.push(BudgetUpdate { iteration, budget });

            debug!(
                "ransac: iteration {}: {} inliers, budget {}",
                iteration,
                best_inliers.len(),
                budget
            );
        }

        let best = best_inliers.len();
        let mut model = match best_model {
            Some(model) if best >= sample_size => model,
            _ => {
                return Err(GeometryError::NoConsensusFound {
                    required: sample_size,
                    best,
                })
            }
        };

        if self.params.refine {
            let inlier_set = correspondence::select(correspondences, &best_inliers);
            match self.estimator.estimate(&inlier_set) {
                Ok(refined) => model = refined,
                Err(err) => warn!("ransac: refit on {} inliers failed: {}", best, err),
            }
        }

        let sum_sq = best_inliers
            .iter()
            .map(|&i| self.estimator.distance(&model, &correspondences[i]).powi(2))
            .sum::<f64>();
        let rmse = (sum_sq / best as f64).sqrt();

        debug!(
            "ransac: done after {} iterations, {} / {} inliers, rmse {:.4}",
            iteration, best, n, rmse
        );

        Ok(RansacReport {
            model,
            inliers: best_inliers,
            iterations: iteration,
            budget_history,
            rmse,
        })
    }

    /// Run RANSAC and replace `correspondences` by the inliers of the best model.
    ///
    /// The surviving correspondences keep their original relative order, and
    /// [`RansacReport::inliers`] still indexes the list as it was before the call. On error
    /// the list is left untouched.
    pub fn fit_in_place<R: RandomSource + ?Sized>(
        &self,
        correspondences: &mut Vec<Correspondence>,
        rng: &mut R,
    ) -> Result<RansacReport<E::Model>, GeometryError> {
        let report = self.fit(correspondences, rng)?;
        *correspondences = correspondence::select(correspondences, &report.inliers);
        Ok(report)
    }
}

/// Fit a model of the given kind with RANSAC and filter `correspondences` to its inliers.
///
/// The fundamental matrix uses the default [`crate::model::Normalization`].
pub fn fit_model<R: RandomSource + ?Sized>(
    kind: ModelKind,
    correspondences: &mut Vec<Correspondence>,
    params: &RansacParams,
    rng: &mut R,
) -> Result<RansacReport<GeometricModel>, GeometryError> {
    match kind {
        ModelKind::Homography => {
            let report = Ransac::new(HomographyEstimator, *params).fit_in_place(correspondences, rng)?;
            let max_residual = homography_residuals(&report.model, correspondences)
                .into_iter()
                .fold(0.0, f64::max);
            debug!("fit_model: max inlier residual |Hx1 x x2| = {:.3e}", max_residual);
            Ok(report.map(GeometricModel::Homography))
        }
        ModelKind::Fundamental => Ransac::new(FundamentalEstimator::default(), *params)
            .fit_in_place(correspondences, rng)
            .map(|r| r.map(GeometricModel::Fundamental)),
    }
}
