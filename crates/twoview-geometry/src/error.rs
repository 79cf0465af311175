/// Errors returned by the model estimators and the robust fitter.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// The sample yields a singular or ill-conditioned linear system.
    #[error("Degenerate sample: the linear system is singular or ill-conditioned")]
    DegenerateSample,

    /// Fewer correspondences than the minimal sample size of the model.
    #[error("Need at least {required} correspondences, got {actual}")]
    InsufficientCorrespondences {
        /// Minimal sample size of the model.
        required: usize,
        /// Number of correspondences supplied.
        actual: usize,
    },

    /// RANSAC exhausted its budget without a model reaching the minimal inlier count.
    #[error("No consensus found: best model has {best} inliers, need at least {required}")]
    NoConsensusFound {
        /// Minimal number of inliers for acceptance.
        required: usize,
        /// Largest inlier count reached during the search.
        best: usize,
    },

    /// A matrix that must be inverted is singular.
    #[error("Matrix is singular and cannot be inverted")]
    SingularMatrix,

    /// A configuration parameter is out of its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}
