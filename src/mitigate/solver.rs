use std::time::{Duration, Instant};

use serde::Serialize;

/// Armijo sufficient-decrease constant.
const ARMIJO: f64 = 1e-4;

/// Smallest step tried by the line search before giving up.
const MIN_STEP: f64 = 1e-14;

/// How the solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    /// Projected-gradient residual fell below the tolerance.
    Converged,
    /// Iteration cap reached first.
    MaxIterations,
    /// The line search could not find a decreasing step.
    Stalled,
    /// Wall-clock limit reached first.
    TimedOut,
}

pub(crate) struct SolverParams {
    pub max_iter: usize,
    pub tolerance: f64,
    pub time_limit: Option<Duration>,
}

/// Last iterate of a solve, returned whether or not it converged.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SolverState {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: usize,
    pub residual: f64,
    pub convergence: Convergence,
}

/// Projection onto the non-negative orthant.
#[inline]
fn project(x: &mut [f64]) { x.iter_mut().for_each(|v| *v = v.max(0.0)) }

/// Infinity norm of `x - P(x - g)`: zero exactly at a KKT point of
/// `min f(x) s.t. x >= 0`.
fn projected_residual(x: &[f64], g: &[f64]) -> f64 {
    x.iter().zip(g).map(|(&x, &g)| (x - (x - g).max(0.0)).abs()).fold(0.0, f64::max)
}

/// Minimize a smooth function subject to `x >= 0` by projected gradient
/// descent with backtracking (Armijo along the projection arc).
///
/// `eval` returns the value and writes the gradient into its second argument.
/// The decision buffer is owned by this call.
pub(crate) fn minimize_nonnegative(
    x0: Vec<f64>,
    params: &SolverParams,
    mut eval: impl FnMut(&[f64], &mut [f64]) -> f64,
) -> SolverState {
    let started = Instant::now();
    let mut x = x0;
    project(&mut x);
    let mut grad = vec![0.0; x.len()];
    let mut value = eval(&x, &mut grad);

    let mut trial = vec![0.0; x.len()];
    let mut trial_grad = vec![0.0; x.len()];
    let mut step = 1.0;

    for iter in 0..params.max_iter {
        let residual = projected_residual(&x, &grad);
        if residual <= params.tolerance {
            return SolverState { x, value, iterations: iter, residual, convergence: Convergence::Converged };
        }
        if params.time_limit.is_some_and(|limit| started.elapsed() >= limit) {
            return SolverState { x, value, iterations: iter, residual, convergence: Convergence::TimedOut };
        }

        // Backtrack until sufficient decrease.
        let accepted = loop {
            trial.iter_mut().zip(x.iter().zip(&grad)).for_each(|(t, (&x, &g))| *t = (x - step * g).max(0.0));
            let moved = trial.iter().zip(&x).map(|(t, x)| (t - x).powi(2)).sum::<f64>();
            let trial_value = eval(&trial, &mut trial_grad);
            if trial_value <= value - ARMIJO / step * moved { break Some(trial_value) }
            step *= 0.5;
            if step < MIN_STEP { break None }
        };

        let Some(trial_value) = accepted else {
            log::debug!("[mitigate::solver] line search stalled at iteration {iter}");
            return SolverState { x, value, iterations: iter, residual, convergence: Convergence::Stalled };
        };

        std::mem::swap(&mut x, &mut trial);
        std::mem::swap(&mut grad, &mut trial_grad);
        value = trial_value;
        step *= 2.0;

        if iter % 100 == 0 {
            log::debug!("[mitigate::solver] iter {iter} value {value:.8} residual {residual:.3e} step {step:.3e}");
        }
    }

    let residual = projected_residual(&x, &grad);
    let convergence = if residual <= params.tolerance { Convergence::Converged } else { Convergence::MaxIterations };
    SolverState { x, value, iterations: params.max_iter, residual, convergence }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(max_iter: usize) -> SolverParams {
        SolverParams { max_iter, tolerance: 1e-9, time_limit: None }
    }

    /// f(x) = sum_i (x_i - c_i)^2
    fn quadratic(center: &'static [f64]) -> impl FnMut(&[f64], &mut [f64]) -> f64 {
        move |x: &[f64], g: &mut [f64]| {
            x.iter().zip(center).zip(g.iter_mut())
                .map(|((&x, &c), g)| { *g = 2.0 * (x - c); (x - c).powi(2) })
                .sum::<f64>()
        }
    }

    #[test]
    fn unconstrained_minimum_inside_orthant() {
        let state = minimize_nonnegative(vec![0.0; 2], &params(500), quadratic(&[1.0, 3.0]));
        assert_eq!(state.convergence, Convergence::Converged);
        assert!((state.x[0] - 1.0).abs() < 1e-6 && (state.x[1] - 3.0).abs() < 1e-6);
    }

    #[test]
    fn active_bound_is_respected() {
        let state = minimize_nonnegative(vec![5.0, 5.0], &params(500), quadratic(&[-2.0, 0.5]));
        assert_eq!(state.convergence, Convergence::Converged);
        assert_eq!(state.x[0], 0.0);
        assert!((state.x[1] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn iteration_cap_returns_last_iterate() {
        let state = minimize_nonnegative(vec![0.0], &params(0), quadratic(&[2.0]));
        assert_eq!(state.convergence, Convergence::MaxIterations);
        assert_eq!(state.x, vec![0.0]);
        assert_eq!(state.value, 4.0);
    }

    #[test]
    fn zero_time_limit_times_out() {
        let params = SolverParams { max_iter: 100, tolerance: 1e-9, time_limit: Some(Duration::ZERO) };
        let state = minimize_nonnegative(vec![0.0], &params, quadratic(&[2.0]));
        assert_eq!(state.convergence, Convergence::TimedOut);
        assert_eq!(state.iterations, 0);
    }
}
