//! Temperature sweep over independent points.
//!
//! Every temperature gets its own runner and RNG stream; the points run in
//! parallel on the rayon pool and a failure at one temperature is recorded
//! without touching the others.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{IsingError, IsingResult};
use crate::ising::analysis;
use crate::ising::{simulate_temperature, PointParams, PointResult, TieBreak};

/// Temperatures to visit, as an arange-style range or an explicit list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TemperatureGrid {
    Range { start: f64, stop: f64, step: f64 },
    List { values: Vec<f64> },
}

impl Default for TemperatureGrid {
    fn default() -> Self {
        TemperatureGrid::Range {
            start: 2.3,
            stop: 2.8,
            step: 0.05,
        }
    }
}

impl TemperatureGrid {
    /// Expand into concrete temperatures.
    ///
    /// A range is half-open `[start, stop)`; stop values within rounding of
    /// the last step are excluded.
    pub fn values(&self) -> IsingResult<Vec<f64>> {
        let values = match self {
            TemperatureGrid::Range { start, stop, step } => {
                if !(step.is_finite() && *step > 0.0) || !start.is_finite() || !stop.is_finite() {
                    return Err(IsingError::InvalidConfig(format!(
                        "temperature range needs finite bounds and a positive step, got {start}..{stop} step {step}"
                    )));
                }
                let n = ((stop - start) / step - 1e-9).ceil().max(0.0) as usize;
                (0..n).map(|k| start + k as f64 * step).collect()
            }
            TemperatureGrid::List { values } => values.clone(),
        };
        if values.is_empty() {
            return Err(IsingError::InvalidConfig("no temperatures to simulate".into()));
        }
        Ok(values)
    }
}

/// Parameters shared by every temperature point of a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    pub lattice_size: usize,
    pub coupling: f64,
    pub field: f64,
    pub n_steps: usize,
    pub n_measure: usize,
    pub tie_break: TieBreak,
    /// Point `k` uses seed `seed + k`.
    pub seed: u64,
}

impl Default for ScanSettings {
    fn default() -> Self {
        ScanSettings {
            lattice_size: 32,
            coupling: 1.0,
            field: 0.0,
            n_steps: 10_000,
            n_measure: 100,
            tie_break: TieBreak::default(),
            seed: 42,
        }
    }
}

impl ScanSettings {
    /// Check everything except the temperature, which is checked per point.
    pub fn validate(&self) -> IsingResult<()> {
        self.point(1.0).validate()
    }

    pub fn point(&self, temperature: f64) -> PointParams {
        PointParams {
            temperature,
            lattice_size: self.lattice_size,
            coupling: self.coupling,
            field: self.field,
            n_steps: self.n_steps,
            n_measure: self.n_measure,
            tie_break: self.tie_break,
        }
    }
}

/// A temperature whose simulation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanFailure {
    pub temperature: f64,
    pub error: String,
}

/// Collated scan output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    /// Successful points, ascending in temperature.
    pub results: Vec<PointResult>,
    pub failures: Vec<ScanFailure>,
    /// Temperature of maximal raw susceptibility.
    pub critical_temperature: Option<f64>,
}

/// Simulate every temperature in parallel and collate the results.
pub fn scan(settings: &ScanSettings, temperatures: &[f64]) -> ScanReport {
    info!(
        "Starting scan of {} temperatures with L = {}, J = {}, H = {}, n_steps = {}, n_measure = {}",
        temperatures.len(),
        settings.lattice_size,
        settings.coupling,
        settings.field,
        settings.n_steps,
        settings.n_measure
    );

    let outcomes: Vec<(f64, IsingResult<PointResult>)> = temperatures
        .par_iter()
        .enumerate()
        .map(|(k, &t)| {
            let seed = settings.seed.wrapping_add(k as u64);
            (t, simulate_temperature(settings.point(t), seed))
        })
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut failures = Vec::new();
    for (temperature, outcome) in outcomes {
        match outcome {
            Ok(result) => results.push(result),
            Err(err) => {
                warn!(temperature, "temperature point failed: {err}");
                failures.push(ScanFailure {
                    temperature,
                    error: err.to_string(),
                });
            }
        }
    }
    results.sort_by(|a, b| a.temperature.total_cmp(&b.temperature));

    let critical_temperature =
        analysis::susceptibility_peak(results.iter().map(|r| (r.temperature, r.chi)));
    if let Some(t_c) = critical_temperature {
        info!("Estimated critical temperature: {:.2}", t_c);
    }

    ScanReport {
        results,
        failures,
        critical_temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_is_half_open() {
        let grid = TemperatureGrid::Range {
            start: 2.3,
            stop: 2.8,
            step: 0.05,
        };
        let values = grid.values().unwrap();
        assert_eq!(values.len(), 10);
        assert!((values[0] - 2.3).abs() < 1e-12);
        assert!((values[9] - 2.75).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_grids() {
        let zero_step = TemperatureGrid::Range {
            start: 1.0,
            stop: 2.0,
            step: 0.0,
        };
        assert!(zero_step.values().is_err());
        let empty = TemperatureGrid::Range {
            start: 2.0,
            stop: 1.0,
            step: 0.1,
        };
        assert!(empty.values().is_err());
        assert!(TemperatureGrid::List { values: vec![] }.values().is_err());
    }

    #[test]
    fn test_scan_isolates_failed_points() {
        let settings = ScanSettings {
            lattice_size: 4,
            coupling: 1.0,
            field: 0.0,
            n_steps: 5,
            n_measure: 5,
            tie_break: TieBreak::TopLeft,
            seed: 3,
        };
        let report = scan(&settings, &[3.0, -1.0, 1.0]);
        assert_eq!(report.results.len(), 2);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].temperature, -1.0);
        assert_eq!(report.results[0].temperature, 1.0);
        assert_eq!(report.results[1].temperature, 3.0);
        assert!(report.critical_temperature.is_some());
    }
}
