//! Statistical estimators over recorded magnetization series and spin grids.
//!
//! All functions are pure: they read samples and return a number or an
//! explicit error for degenerate input. Nothing here divides by zero silently.

use itertools::iproduct;

use super::fit::CurveFitter;
use super::lattice::Lattice;
use crate::error::{FitError, IsingError, IsingResult};

/// Arithmetic mean of a series.
pub fn mean(samples: &[f64]) -> IsingResult<f64> {
    if samples.is_empty() {
        return Err(IsingError::EmptySeries);
    }
    Ok(samples.iter().sum::<f64>() / samples.len() as f64)
}

/// Population variance (divides by n, not n - 1).
pub fn population_variance(samples: &[f64]) -> IsingResult<f64> {
    let m = mean(samples)?;
    let var = samples.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / samples.len() as f64;
    Ok(var.max(0.0))
}

/// Magnetic susceptibility from fluctuations: χ = β Var(M) N.
///
/// `n_sites` must be the site count of the lattice the series came from.
pub fn susceptibility(magnetizations: &[f64], beta: f64, n_sites: usize) -> IsingResult<f64> {
    Ok(beta * population_variance(magnetizations)? * n_sites as f64)
}

/// Binder cumulant U = 1 - <M⁴> / (3 <M²>²).
pub fn binder_cumulant(magnetizations: &[f64]) -> IsingResult<f64> {
    if magnetizations.is_empty() {
        return Err(IsingError::EmptySeries);
    }
    let n = magnetizations.len() as f64;
    let m2 = magnetizations.iter().map(|m| m.powi(2)).sum::<f64>() / n;
    let m4 = magnetizations.iter().map(|m| m.powi(4)).sum::<f64>() / n;
    if m2 == 0.0 {
        return Err(IsingError::DegenerateSeries(
            "second moment of magnetization is zero".into(),
        ));
    }
    Ok(1.0 - m4 / (3.0 * m2 * m2))
}

/// Connected correlation G(r) along the lattice diagonal.
///
/// Entry `k` holds `G(k + 1)` for `r` in `[1, L/4)`:
/// `<s(x, y) s(x + r, y + r)> - <s>²`, with periodic wrap.
pub fn diagonal_correlation(lattice: &Lattice) -> Vec<f64> {
    let size = lattice.size();
    let n_sites = lattice.n_sites() as f64;
    let disconnected = lattice.mean_spin().powi(2);
    (1..size / 4)
        .map(|r| {
            let sum: i64 = iproduct!(0..size, 0..size)
                .map(|(x, y)| {
                    let s = lattice.spin(x, y) as i64;
                    let t = lattice.spin((x + r) % size, (y + r) % size) as i64;
                    s * t
                })
                .sum();
            sum as f64 / n_sites - disconnected
        })
        .collect()
}

/// Correlation length ξ from fitting G(r) ≈ exp(-r / ξ).
///
/// Degenerate correlation data or a failed fit is an error; callers treat it
/// as "undefined at this temperature".
pub fn correlation_length<F: CurveFitter + ?Sized>(
    lattice: &Lattice,
    fitter: &F,
) -> IsingResult<f64> {
    let ys = diagonal_correlation(lattice);
    if ys.is_empty() {
        return Err(FitError::NotEnoughPoints { needed: 1, got: 0 }.into());
    }
    let xs: Vec<f64> = (1..=ys.len()).map(|r| r as f64).collect();
    let model = |r: f64, p: &[f64]| (-r / p[0]).exp();
    let params = fitter.fit(&model, &xs, &ys, &[1.0])?;
    let xi = params[0];
    if !xi.is_finite() || xi <= 0.0 {
        return Err(IsingError::DegenerateSeries(format!(
            "fitted correlation length {xi} is not positive"
        )));
    }
    Ok(xi)
}
