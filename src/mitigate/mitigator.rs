//! Demographic-parity post-processing of multi-class scores.
//!
//! For a binary split of the observations into sides `s = 0, 1` with
//! prevalences `p_s`, the corrected score of class `k` is
//!
//! ```text
//! p_s * score_k - sign_s * (lambda_k - beta_k),   sign_0 = -1, sign_1 = +1
//! ```
//!
//! and `(lambda, beta) >= 0` minimize
//!
//! ```text
//! sum_s mean_{i in s} smoothmax_c(corrected_i) + eps * sum_k (lambda_k + beta_k)
//! ```
//!
//! where `smoothmax_c(v) = sum_k softmax(v / c)_k v_k` stands in for the
//! arg-max class selection. At a stationary point the soft class
//! proportions of both sides differ by at most `eps` in every class.

use std::time::Duration;

use ndarray::{Array1, Array2, ArrayView2, Axis};
use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::error::{Error, Result};
use crate::mitigate::solver::{minimize_nonnegative, SolverParams};
use crate::mitigate::unfairness::{smooth_max, softmax_rows};
use crate::mitigate::Convergence;

/// Tunable parameters of the mitigation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MitigationParams {
    /// Softmax temperature `c` of the smooth maximum (> 0).
    pub temperature: f64,
    /// Upper bound `sigma` of the uniform jitter added to scores at inference (>= 0).
    pub noise: f64,
    /// Weight `eps` of the penalty on the size of the corrections (>= 0).
    pub penalty: f64,
    pub max_iter: usize,
    /// Tolerance on the projected-gradient residual.
    pub tolerance: f64,
    /// Wall-clock budget for the solve; a timed-out solve is not converged.
    pub time_limit: Option<Duration>,
    pub seed: Option<u64>,
}

impl Default for MitigationParams {
    fn default() -> Self {
        Self {
            temperature: 0.01,
            noise: 1e-5,
            penalty: 1e-3,
            max_iter: 1000,
            tolerance: 1e-6,
            time_limit: None,
            seed: None,
        }
    }
}

/// Per-class corrections `(lambda, beta)` and how the solve ended.
#[derive(Debug, Clone, PartialEq)]
pub struct Corrections {
    pub lambda: Array1<f64>,
    pub beta: Array1<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub residual: f64,
    pub convergence: Convergence,
}

impl Corrections {
    #[inline] pub fn converged(&self) -> bool { self.convergence == Convergence::Converged }

    /// `lambda - beta`, the net shift applied to each class.
    pub fn shift(&self) -> Array1<f64> { &self.lambda - &self.beta }
}

/// Mitigated predictions for every observation.
#[derive(Debug, Clone)]
pub struct MitigationResult {
    pub corrections: Corrections,
    /// New predicted class per observation, 1-based.
    pub classes: Vec<usize>,
    /// Corrected scores before softmax, `n x K`.
    pub raw: Array2<f64>,
    /// Softmax of `raw`, rows sum to 1.
    pub probabilities: Array2<f64>,
}

/// Binary split of the observations with its prevalences.
struct Sides {
    members: [Vec<usize>; 2],
    prevalence: [f64; 2],
}

impl Sides {
    fn new(sides: &[bool]) -> Result<Self> {
        let members = [
            sides.iter().enumerate().filter_map(|(i, &s)| (!s).then_some(i)).collect::<Vec<_>>(),
            sides.iter().enumerate().filter_map(|(i, &s)| s.then_some(i)).collect::<Vec<_>>(),
        ];
        if members.iter().any(Vec::is_empty) {
            return Err(Error::DegenerateGroup(format!(
                "protected indicator selects {} of {} observations; both sides need members",
                members[1].len(), sides.len())));
        }
        let n = sides.len() as f64;
        let prevalence = [members[0].len() as f64 / n, members[1].len() as f64 / n];
        Ok(Self { members, prevalence })
    }

    /// `-1` for side 0, `+1` for side 1.
    #[inline] fn sign(side: usize) -> f64 { if side == 0 { -1.0 } else { 1.0 } }
}

/// Solves for fairness corrections and applies them.
#[derive(Debug, Clone, Copy, Default)]
pub struct DpMitigator {
    params: MitigationParams,
}

impl DpMitigator {
    pub fn new(params: MitigationParams) -> Result<Self> {
        if !(params.temperature.is_finite() && params.temperature > 0.0) {
            return Err(Error::InvalidConfig(format!("temperature must be > 0, got {}", params.temperature)));
        }
        if !(params.noise.is_finite() && params.noise >= 0.0) {
            return Err(Error::InvalidConfig(format!("noise must be >= 0, got {}", params.noise)));
        }
        if !(params.penalty.is_finite() && params.penalty >= 0.0) {
            return Err(Error::InvalidConfig(format!("penalty must be >= 0, got {}", params.penalty)));
        }
        if !(params.tolerance.is_finite() && params.tolerance > 0.0) {
            return Err(Error::InvalidConfig(format!("tolerance must be > 0, got {}", params.tolerance)));
        }
        Ok(Self { params })
    }

    #[inline] pub fn params(&self) -> &MitigationParams { &self.params }

    /// Check shapes and the protected split before any solve.
    fn validate(scores: &ArrayView2<f64>, sides: &[bool]) -> Result<Sides> {
        if scores.nrows() != sides.len() {
            return Err(Error::LengthMismatch { what: "protected indicator", expected: scores.nrows(), found: sides.len() });
        }
        if scores.ncols() < 2 {
            return Err(Error::InvalidConfig(format!("need at least 2 classes, got {}", scores.ncols())));
        }
        if scores.iter().any(|v| !v.is_finite()) {
            return Err(Error::InvalidConfig("scores must be finite".into()));
        }
        Sides::new(sides)
    }

    /// Objective value and gradient at `x = [lambda, beta]`.
    fn objective(&self, scores: &ArrayView2<f64>, sides: &Sides, x: &[f64], grad: &mut [f64]) -> f64 {
        let k = scores.ncols();
        let (lambda, beta) = x.split_at(k);
        let shift = lambda.iter().zip(beta).map(|(l, b)| l - b).collect::<Array1<f64>>();
        let c = self.params.temperature;

        let mut value = 0.0;
        let mut d_shift = vec![0.0; k];
        let mut weights = vec![0.0; k];
        for side in 0..2 {
            let (p, sign) = (sides.prevalence[side], Sides::sign(side));
            let members = &sides.members[side];
            let m = members.len() as f64;
            let mut side_value = 0.0;
            for &i in members {
                let val = scores.row(i).mapv(|s| p * s) - &shift * sign;
                let f = smooth_max(val.view(), c, &mut weights);
                side_value += f;
                // d smoothmax / d val_k = w_k (1 + (val_k - f) / c); d val / d shift = -sign
                for ((d, &w), &v) in d_shift.iter_mut().zip(&weights).zip(&val) {
                    *d -= sign * w * (1.0 + (v - f) / c) / m;
                }
            }
            value += side_value / m;
        }

        let eps = self.params.penalty;
        value += eps * x.iter().sum::<f64>();
        let (g_lambda, g_beta) = grad.split_at_mut(k);
        for j in 0..k {
            g_lambda[j] = d_shift[j] + eps;
            g_beta[j] = -d_shift[j] + eps;
        }
        value
    }

    /// Solve for `(lambda, beta)` starting from zero. Non-convergence is
    /// reported on the result with the last iterate, never as an error.
    pub fn fit(&self, scores: ArrayView2<f64>, sides: &[bool]) -> Result<Corrections> {
        let split = Self::validate(&scores, sides)?;
        let k = scores.ncols();

        let params = SolverParams {
            max_iter: self.params.max_iter,
            tolerance: self.params.tolerance,
            time_limit: self.params.time_limit,
        };
        let state = minimize_nonnegative(vec![0.0; 2 * k], &params, |x, g| self.objective(&scores, &split, x, g));

        if state.convergence != Convergence::Converged {
            log::warn!("[mitigate] solver did not converge ({:?}) after {} iterations, residual {:.3e}; returning last iterate",
                state.convergence, state.iterations, state.residual);
        } else {
            log::info!("[mitigate] converged in {} iterations, objective {:.6}", state.iterations, state.value);
        }

        Ok(Corrections {
            lambda: Array1::from(state.x[..k].to_vec()),
            beta: Array1::from(state.x[k..].to_vec()),
            objective: state.value,
            iterations: state.iterations,
            residual: state.residual,
            convergence: state.convergence,
        })
    }

    /// Apply corrections: jitter each score by `U[0, sigma)`, correct it, and
    /// take the arg-max as the new 1-based class.
    pub fn predict(&self, corrections: Corrections, scores: ArrayView2<f64>, sides: &[bool]) -> Result<MitigationResult> {
        let split = Self::validate(&scores, sides)?;
        if corrections.lambda.len() != scores.ncols() || corrections.beta.len() != scores.ncols() {
            return Err(Error::LengthMismatch { what: "corrections", expected: scores.ncols(), found: corrections.lambda.len() });
        }

        let mut rng = self.params.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let sigma = self.params.noise;
        let shift = corrections.shift();

        let mut raw = scores.to_owned();
        for side in 0..2 {
            let (p, sign) = (split.prevalence[side], Sides::sign(side));
            for &i in &split.members[side] {
                let mut row = raw.row_mut(i);
                row.iter_mut().zip(&shift).for_each(|(v, &d)| {
                    let jitter = if sigma > 0.0 { rng.random_range(0.0..sigma) } else { 0.0 };
                    *v = p * (*v + jitter) - sign * d;
                });
            }
        }

        let classes = raw.axis_iter(Axis(0))
            .map(|row| {
                row.iter().enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (k, &v)| if v > best.1 { (k, v) } else { best })
                    .0 + 1
            })
            .collect();
        let probabilities = softmax_rows(&raw);

        Ok(MitigationResult { corrections, classes, raw, probabilities })
    }

    /// `fit` followed by `predict`.
    pub fn mitigate(&self, scores: ArrayView2<f64>, sides: &[bool]) -> Result<MitigationResult> {
        let corrections = self.fit(scores, sides)?;
        self.predict(corrections, scores, sides)
    }
}
