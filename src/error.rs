//! Error hierarchy for the Ising engine.

use thiserror::Error;

/// Failure of a nonlinear least-squares fit.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    /// Fewer samples than free parameters.
    #[error("need at least {needed} sample points, got {got}")]
    NotEnoughPoints { needed: usize, got: usize },

    /// Samples are all zero, so the model carries no information.
    #[error("sample values are all zero")]
    AllZero,

    /// A residual, Jacobian entry or parameter became NaN/Inf.
    #[error("non-finite value during fit")]
    NonFinite,

    /// The model was driven to zero over every sample point.
    #[error("model collapsed to zero over the sample points")]
    Collapsed,

    /// The normal equations could not be solved.
    #[error("singular normal equations")]
    Singular,

    /// Iteration limit reached before the step size settled.
    #[error("fit did not converge after {iterations} iterations")]
    DidNotConverge { iterations: usize },
}

/// Root error type for the Ising engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IsingError {
    /// Caller supplied parameters outside the accepted ranges.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Block-spin coarse-graining needs an even side length.
    #[error("cannot coarse-grain a lattice of odd side {size}")]
    OddLattice { size: usize },

    /// An estimator received no samples.
    #[error("sample series is empty")]
    EmptySeries,

    /// An estimator's denominator vanished.
    #[error("degenerate series: {0}")]
    DegenerateSeries(String),

    /// Correlation-length fit failed.
    #[error("fit error: {0}")]
    Fit(#[from] FitError),
}

pub type IsingResult<T> = Result<T, IsingError>;
