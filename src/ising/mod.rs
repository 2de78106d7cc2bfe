pub mod analysis;
pub mod estimators;
pub mod fit;
pub mod lattice;
pub mod metropolis;
pub mod renormalize;
pub mod runner;

pub use fit::{CurveFitter, LevenbergMarquardt};
pub use lattice::Lattice;
pub use metropolis::{sweep, SweepStats};
pub use renormalize::{coarse_grain, TieBreak};
pub use runner::{simulate_temperature, PointParams, PointResult, PointRunner};
