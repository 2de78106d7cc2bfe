//! Single-temperature simulation: equilibrate, measure, renormalize, measure.
//!
//! A [`PointRunner`] owns its lattice and RNG stream and is consumed by
//! [`PointRunner::run`], so each temperature point reaches its terminal state
//! exactly once and shares nothing with its siblings.

use std::fmt;
use std::time::Instant;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::estimators;
use super::fit::{CurveFitter, LevenbergMarquardt};
use super::lattice::Lattice;
use super::metropolis::{self, SweepStats};
use super::renormalize::{self, TieBreak};
use crate::error::{IsingError, IsingResult};

/// Smallest lattice side that survives one coarse-graining step meaningfully.
pub const MIN_LATTICE_SIZE: usize = 4;

/// Inputs for one temperature point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointParams {
    pub temperature: f64,
    pub lattice_size: usize,
    pub coupling: f64,
    pub field: f64,
    /// Equilibration sweeps, discarded.
    pub n_steps: usize,
    /// Measurement sweeps, per lattice.
    pub n_measure: usize,
    #[serde(default)]
    pub tie_break: TieBreak,
}

impl PointParams {
    /// Reject parameter sets the simulation cannot honour.
    pub fn validate(&self) -> IsingResult<()> {
        if !(self.temperature.is_finite() && self.temperature > 0.0) {
            return Err(IsingError::InvalidConfig(format!(
                "temperature must be finite and positive, got {}",
                self.temperature
            )));
        }
        if self.lattice_size < MIN_LATTICE_SIZE || self.lattice_size % 2 != 0 {
            return Err(IsingError::InvalidConfig(format!(
                "lattice size must be even and at least {MIN_LATTICE_SIZE}, got {}",
                self.lattice_size
            )));
        }
        if !self.coupling.is_finite() || !self.field.is_finite() {
            return Err(IsingError::InvalidConfig(format!(
                "coupling and field must be finite, got J = {}, H = {}",
                self.coupling, self.field
            )));
        }
        if self.n_measure == 0 {
            return Err(IsingError::InvalidConfig(
                "n_measure must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Same parameters at another temperature.
    pub fn at_temperature(&self, temperature: f64) -> Self {
        PointParams {
            temperature,
            ..self.clone()
        }
    }
}

/// Outcome of one temperature point. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointResult {
    pub temperature: f64,
    pub m_avg: f64,
    pub chi: f64,
    pub m_avg_renorm: f64,
    pub chi_renorm: f64,
    /// `None` when the correlation fit failed or the data was degenerate.
    pub correlation_length: Option<f64>,
    pub correlation_length_renorm: Option<f64>,
    /// `None` when the second moment vanished.
    pub binder: Option<f64>,
    pub binder_renorm: Option<f64>,
    pub final_spins: Vec<Vec<i8>>,
    pub final_renorm_spins: Vec<Vec<i8>>,
    pub magnetizations: Vec<f64>,
    pub renorm_magnetizations: Vec<f64>,
}

/// Phases of a temperature point, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Init,
    Equilibrating,
    MeasuringRaw,
    Renormalizing,
    MeasuringCoarse,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Init => "init",
            Phase::Equilibrating => "equilibrating",
            Phase::MeasuringRaw => "measuring(raw)",
            Phase::Renormalizing => "renormalizing",
            Phase::MeasuringCoarse => "measuring(coarse)",
            Phase::Done => "done",
        };
        f.write_str(name)
    }
}

/// Runs one temperature point to completion.
pub struct PointRunner<R: Rng, F: CurveFitter = LevenbergMarquardt> {
    params: PointParams,
    beta: f64,
    rng: R,
    fitter: F,
    phase: Phase,
}

impl PointRunner<Xoshiro256StarStar> {
    /// Runner with its own seeded RNG stream and the default fitter.
    pub fn seeded(params: PointParams, seed: u64) -> IsingResult<Self> {
        Self::new(
            params,
            Xoshiro256StarStar::seed_from_u64(seed),
            LevenbergMarquardt::default(),
        )
    }
}

impl<R: Rng, F: CurveFitter> PointRunner<R, F> {
    /// Validates `params` before any simulation work.
    pub fn new(params: PointParams, rng: R, fitter: F) -> IsingResult<Self> {
        params.validate()?;
        let beta = 1.0 / params.temperature;
        Ok(PointRunner {
            params,
            beta,
            rng,
            fitter,
            phase: Phase::Init,
        })
    }

    fn enter(&mut self, phase: Phase) {
        debug!(
            temperature = self.params.temperature,
            from = %self.phase,
            to = %phase,
            "phase transition"
        );
        self.phase = phase;
    }

    /// Run `n` sweeps, recording the mean spin after each when `record` is set.
    fn run_sweeps(&mut self, lattice: &mut Lattice, n: usize, record: bool) -> (Vec<f64>, SweepStats) {
        let PointParams { coupling, field, .. } = self.params;
        let mut series = Vec::with_capacity(if record { n } else { 0 });
        let mut stats = SweepStats::default();
        for _ in 0..n {
            stats.merge(metropolis::sweep(
                lattice,
                self.beta,
                coupling,
                field,
                &mut self.rng,
            ));
            if record {
                series.push(lattice.mean_spin());
            }
        }
        (series, stats)
    }

    fn optional_metric(&self, name: &str, value: IsingResult<f64>) -> Option<f64> {
        match value {
            Ok(v) => Some(v),
            Err(err) => {
                warn!(
                    temperature = self.params.temperature,
                    metric = name,
                    "metric undefined: {err}"
                );
                None
            }
        }
    }

    /// Execute every phase and assemble the result.
    pub fn run(mut self) -> IsingResult<PointResult> {
        let start = Instant::now();
        let temperature = self.params.temperature;
        info!("Starting simulation for T = {:.2}", temperature);

        let mut lattice = Lattice::new_ordered(self.params.lattice_size);

        self.enter(Phase::Equilibrating);
        let (_, burn_in) = self.run_sweeps(&mut lattice, self.params.n_steps, false);
        debug!(
            temperature,
            acceptance = burn_in.acceptance_ratio(),
            "equilibration finished"
        );

        self.enter(Phase::MeasuringRaw);
        let (magnetizations, raw_stats) =
            self.run_sweeps(&mut lattice, self.params.n_measure, true);
        debug!(
            temperature,
            acceptance = raw_stats.acceptance_ratio(),
            "raw measurement finished"
        );

        self.enter(Phase::Renormalizing);
        let mut coarse = renormalize::coarse_grain(&lattice, self.params.tie_break, &mut self.rng)?;

        // The coarse lattice is measured straight away, without re-equilibration.
        self.enter(Phase::MeasuringCoarse);
        let (renorm_magnetizations, coarse_stats) =
            self.run_sweeps(&mut coarse, self.params.n_measure, true);
        debug!(
            temperature,
            acceptance = coarse_stats.acceptance_ratio(),
            "coarse measurement finished"
        );

        self.enter(Phase::Done);
        let m_avg = estimators::mean(&magnetizations)?;
        let chi = estimators::susceptibility(&magnetizations, self.beta, lattice.n_sites())?;
        let m_avg_renorm = estimators::mean(&renorm_magnetizations)?;
        let chi_renorm =
            estimators::susceptibility(&renorm_magnetizations, self.beta, coarse.n_sites())?;

        let correlation_length = self.optional_metric(
            "correlation_length",
            estimators::correlation_length(&lattice, &self.fitter),
        );
        let correlation_length_renorm = self.optional_metric(
            "correlation_length_renorm",
            estimators::correlation_length(&coarse, &self.fitter),
        );
        let binder = self.optional_metric("binder", estimators::binder_cumulant(&magnetizations));
        let binder_renorm = self.optional_metric(
            "binder_renorm",
            estimators::binder_cumulant(&renorm_magnetizations),
        );

        info!(
            "Simulation for T = {:.2} completed in {:.2} seconds.",
            temperature,
            start.elapsed().as_secs_f64()
        );

        Ok(PointResult {
            temperature,
            m_avg,
            chi,
            m_avg_renorm,
            chi_renorm,
            correlation_length,
            correlation_length_renorm,
            binder,
            binder_renorm,
            final_spins: lattice.spin_rows(),
            final_renorm_spins: coarse.spin_rows(),
            magnetizations,
            renorm_magnetizations,
        })
    }
}

/// Simulate one temperature point with its own RNG stream seeded by `seed`.
pub fn simulate_temperature(params: PointParams, seed: u64) -> IsingResult<PointResult> {
    PointRunner::seeded(params, seed)?.run()
}
