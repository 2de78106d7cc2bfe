// Block-spin renormalization study of the 2D Ising model

pub mod error;
pub mod ising;
pub mod scan;

pub use error::{FitError, IsingError, IsingResult};
pub use ising::{simulate_temperature, Lattice, PointParams, PointResult, TieBreak};
pub use scan::{scan, ScanReport, ScanSettings, TemperatureGrid};
