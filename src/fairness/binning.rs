use crate::error::{Error, Result};

/// Partition of the outcome range into `K` ordered classes by empirical
/// quantile cutoffs of the observed values.
///
/// The same cutoffs classify both observed and predicted values. Classes are
/// right-closed, `(c_{k-1}, c_k]`, with the lowest class also taking values
/// at or below the first cutoff and the highest class everything above the
/// last one, so predictions outside the observed range are clamped to the
/// end classes. Class indices are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantileBinning {
    cutoffs: Vec<f64>, // K - 1 interior cutoffs, non-decreasing
}

impl QuantileBinning {
    /// Fit cutoffs at probabilities `1/K, 2/K, ..., (K-1)/K` using linear
    /// interpolation between order statistics. Non-finite values are ignored.
    pub fn fit(values: &[f64], classes: usize) -> Result<Self> {
        if classes < 2 {
            return Err(Error::InvalidConfig(format!("need at least 2 classes, got {classes}")));
        }

        let mut sorted = values.iter().copied().filter(|v| v.is_finite()).collect::<Vec<_>>();
        if sorted.is_empty() {
            return Err(Error::EmptySample("no finite values to fit quantile cutoffs".into()));
        }
        sorted.sort_unstable_by(f64::total_cmp);

        let cutoffs = (1..classes)
            .map(|j| quantile_sorted(&sorted, j as f64 / classes as f64))
            .collect();
        Ok(Self { cutoffs })
    }

    /// Build from explicit cutoffs (e.g. previously persisted ones).
    pub fn from_cutoffs(cutoffs: Vec<f64>) -> Result<Self> {
        if cutoffs.is_empty() {
            return Err(Error::InvalidConfig("need at least one cutoff (2 classes)".into()));
        }
        if cutoffs.iter().any(|c| !c.is_finite()) || cutoffs.windows(2).any(|w| w[0] > w[1]) {
            return Err(Error::InvalidConfig(format!("cutoffs must be finite and non-decreasing: {cutoffs:?}")));
        }
        Ok(Self { cutoffs })
    }

    #[inline] pub fn num_classes(&self) -> usize { self.cutoffs.len() + 1 }

    #[inline] pub fn cutoffs(&self) -> &[f64] { &self.cutoffs }

    /// 0-based class of a value: the number of cutoffs strictly below it.
    #[inline]
    pub fn classify(&self, value: f64) -> usize {
        self.cutoffs.partition_point(|&c| c < value)
    }

    pub fn classify_all(&self, values: &[f64]) -> Vec<usize> {
        values.iter().map(|&v| self.classify(v)).collect()
    }
}

/// Quantile with linear interpolation at `h = (n - 1) p`.
fn quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(sorted.len() - 1);
    sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
}
