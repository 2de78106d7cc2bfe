//! Nonlinear least-squares curve fitting.
//!
//! The correlation-length estimator only needs "fit this model to these
//! points", so the solver sits behind [`CurveFitter`] and can be swapped.

use nalgebra::{DMatrix, DVector};

use crate::error::FitError;

/// Scalar model `y = f(x; params)`.
pub type Model<'a> = &'a dyn Fn(f64, &[f64]) -> f64;

/// Trait for least-squares fitting backends
pub trait CurveFitter {
    /// Fit `model` to the points `(xs[k], ys[k])`, starting from `initial`.
    fn fit(
        &self,
        model: Model<'_>,
        xs: &[f64],
        ys: &[f64],
        initial: &[f64],
    ) -> Result<Vec<f64>, FitError>;
}

/// Levenberg–Marquardt with a forward-difference Jacobian.
#[derive(Debug, Clone)]
pub struct LevenbergMarquardt {
    pub max_iterations: usize,
    /// Relative step size below which the fit counts as converged.
    pub tolerance: f64,
    pub initial_damping: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        LevenbergMarquardt {
            max_iterations: 200,
            tolerance: 1e-10,
            initial_damping: 1e-3,
        }
    }
}

const MAX_DAMPING: f64 = 1e16;

fn residuals(model: Model<'_>, xs: &[f64], ys: &[f64], params: &DVector<f64>) -> DVector<f64> {
    DVector::from_iterator(
        xs.len(),
        xs.iter()
            .zip(ys)
            .map(|(&x, &y)| y - model(x, params.as_slice())),
    )
}

fn jacobian(model: Model<'_>, xs: &[f64], params: &DVector<f64>) -> DMatrix<f64> {
    let n_params = params.len();
    let mut jac = DMatrix::zeros(xs.len(), n_params);
    let base: Vec<f64> = xs.iter().map(|&x| model(x, params.as_slice())).collect();
    for a in 0..n_params {
        let h = f64::EPSILON.sqrt() * params[a].abs().max(1.0);
        let mut shifted = params.clone();
        shifted[a] += h;
        for (k, &x) in xs.iter().enumerate() {
            jac[(k, a)] = (model(x, shifted.as_slice()) - base[k]) / h;
        }
    }
    jac
}

/// Whether the model carries no signal at `params`.
///
/// A vanishing Jacobian or a residual no better than the zero function means
/// the parameters were driven to a limit where the model is flat zero.
fn collapsed(
    model: Model<'_>,
    xs: &[f64],
    ys: &[f64],
    params: &DVector<f64>,
    cost: f64,
) -> bool {
    let y_norm_sq: f64 = ys.iter().map(|y| y * y).sum();
    let jac_norm = jacobian(model, xs, params).norm();
    jac_norm <= f64::EPSILON.sqrt() * y_norm_sq.sqrt() || cost >= (1.0 - 1e-9) * y_norm_sq
}

fn settled(
    model: Model<'_>,
    xs: &[f64],
    ys: &[f64],
    params: DVector<f64>,
    cost: f64,
) -> Result<Vec<f64>, FitError> {
    if collapsed(model, xs, ys, &params, cost) {
        return Err(FitError::Collapsed);
    }
    Ok(params.iter().copied().collect())
}

impl CurveFitter for LevenbergMarquardt {
    fn fit(
        &self,
        model: Model<'_>,
        xs: &[f64],
        ys: &[f64],
        initial: &[f64],
    ) -> Result<Vec<f64>, FitError> {
        let n_points = xs.len().min(ys.len());
        if n_points < initial.len() || n_points == 0 {
            return Err(FitError::NotEnoughPoints {
                needed: initial.len().max(1),
                got: n_points,
            });
        }
        let (xs, ys) = (&xs[..n_points], &ys[..n_points]);
        if ys.iter().chain(xs).chain(initial).any(|v| !v.is_finite()) {
            return Err(FitError::NonFinite);
        }
        if ys.iter().all(|&y| y == 0.0) {
            return Err(FitError::AllZero);
        }

        let mut params = DVector::from_column_slice(initial);
        let mut r = residuals(model, xs, ys, &params);
        let mut cost = r.norm_squared();
        if !cost.is_finite() {
            return Err(FitError::NonFinite);
        }
        let mut damping = self.initial_damping;

        for iteration in 0..self.max_iterations {
            let jac = jacobian(model, xs, &params);
            if jac.iter().any(|v| !v.is_finite()) {
                return Err(FitError::NonFinite);
            }
            let jtj = jac.transpose() * &jac;
            let gradient = jac.transpose() * &r;

            // Retry with heavier damping until a step lowers the cost.
            loop {
                let mut system = jtj.clone();
                for a in 0..system.nrows() {
                    let d = jtj[(a, a)];
                    system[(a, a)] += damping * if d > 0.0 { d } else { 1.0 };
                }
                let Some(chol) = system.cholesky() else {
                    damping *= 10.0;
                    if damping > MAX_DAMPING {
                        return Err(FitError::Singular);
                    }
                    continue;
                };
                let step = chol.solve(&gradient);
                let small_step =
                    step.norm() <= self.tolerance * (params.norm() + self.tolerance);

                let trial = &params + &step;
                let trial_r = residuals(model, xs, ys, &trial);
                let trial_cost = trial_r.norm_squared();

                if trial_cost.is_finite() && trial_cost <= cost {
                    params = trial;
                    r = trial_r;
                    cost = trial_cost;
                    damping = (damping / 10.0).max(f64::MIN_POSITIVE);
                    if small_step {
                        return settled(model, xs, ys, params, cost);
                    }
                    break;
                }
                if small_step {
                    // No downhill step left at this resolution: local minimum.
                    return settled(model, xs, ys, params, cost);
                }
                damping *= 10.0;
                if damping > MAX_DAMPING {
                    if collapsed(model, xs, ys, &params, cost) {
                        return Err(FitError::Collapsed);
                    }
                    return Err(FitError::DidNotConverge {
                        iterations: iteration + 1,
                    });
                }
            }
        }

        Err(FitError::DidNotConverge {
            iterations: self.max_iterations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn decay(r: f64, p: &[f64]) -> f64 {
        (-r / p[0]).exp()
    }

    #[test]
    fn test_recovers_exponential_decay_length() {
        let xs: Vec<f64> = (1..8).map(|r| r as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&r| (-r / 2.5).exp()).collect();
        let params = LevenbergMarquardt::default()
            .fit(&decay, &xs, &ys, &[1.0])
            .unwrap();
        assert_relative_eq!(params[0], 2.5, epsilon = 1e-6);
    }

    #[test]
    fn test_two_parameter_line() {
        let line = |x: f64, p: &[f64]| p[0] + p[1] * x;
        let xs = [0.0, 1.0, 2.0, 3.0];
        let ys = [1.0, 3.0, 5.0, 7.0];
        let params = LevenbergMarquardt::default()
            .fit(&line, &xs, &ys, &[0.0, 0.0])
            .unwrap();
        assert_relative_eq!(params[0], 1.0, epsilon = 1e-6);
        assert_relative_eq!(params[1], 2.0, epsilon = 1e-6);
    }

    #[test]
    fn test_rejects_all_zero_samples() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [0.0, 0.0, 0.0];
        let err = LevenbergMarquardt::default()
            .fit(&decay, &xs, &ys, &[1.0])
            .unwrap_err();
        assert_eq!(err, FitError::AllZero);
    }

    #[test]
    fn test_rejects_empty_input() {
        let err = LevenbergMarquardt::default()
            .fit(&decay, &[], &[], &[1.0])
            .unwrap_err();
        assert!(matches!(err, FitError::NotEnoughPoints { got: 0, .. }));
    }

    #[test]
    fn test_noise_without_decay_is_rejected() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [-0.05, 0.02, -0.01];
        let err = LevenbergMarquardt::default()
            .fit(&decay, &xs, &ys, &[1.0])
            .unwrap_err();
        assert_eq!(err, FitError::Collapsed);
    }

    #[test]
    fn test_negative_samples_are_rejected() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [-0.2, -0.1, -0.05, -0.02];
        let err = LevenbergMarquardt::default()
            .fit(&decay, &xs, &ys, &[1.0])
            .unwrap_err();
        assert_eq!(err, FitError::Collapsed);
    }

    #[test]
    fn test_short_decay_length_is_still_accepted() {
        let xs: Vec<f64> = (1..5).map(|r| r as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|&r| (-r / 0.3).exp()).collect();
        let params = LevenbergMarquardt::default()
            .fit(&decay, &xs, &ys, &[1.0])
            .unwrap();
        assert_relative_eq!(params[0], 0.3, epsilon = 1e-4);
    }

    #[test]
    fn test_iteration_limit_reports_non_convergence() {
        let fitter = LevenbergMarquardt {
            max_iterations: 0,
            ..LevenbergMarquardt::default()
        };
        let err = fitter.fit(&decay, &[1.0, 2.0], &[0.5, 0.25], &[1.0]).unwrap_err();
        assert_eq!(err, FitError::DidNotConverge { iterations: 0 });
    }
}
