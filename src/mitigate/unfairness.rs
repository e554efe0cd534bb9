use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{Error, Result};

/// Maximum absolute difference between the empirical class-frequency
/// histograms of two label sequences. Histograms span `0..=max` over the
/// labels of both sequences, so classes seen in only one count as zero
/// frequency in the other.
pub fn unfairness(labels_a: &[usize], labels_b: &[usize]) -> Result<f64> {
    if labels_a.is_empty() || labels_b.is_empty() {
        return Err(Error::EmptySample("unfairness needs two non-empty label sequences".into()));
    }

    let bins = labels_a.iter().chain(labels_b).max().map_or(0, |&m| m + 1);
    let a = histogram(labels_a, bins);
    let b = histogram(labels_b, bins);
    Ok(a.iter().zip(&b).map(|(x, y)| (x - y).abs()).fold(0.0, f64::max))
}

fn histogram(labels: &[usize], bins: usize) -> Vec<f64> {
    let n = labels.len() as f64;
    labels.iter().fold(vec![0.0; bins], |mut acc, &l| { acc[l] += 1.0; acc })
        .into_iter()
        .map(|c| c / n)
        .collect()
}

/// Row-wise softmax, shifted by the row max for stability.
pub fn softmax_rows(values: &Array2<f64>) -> Array2<f64> {
    let mut out = values.clone();
    out.axis_iter_mut(Axis(0)).for_each(|mut row| {
        let max = row.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
        row.mapv_inplace(|v| (v - max).exp());
        let total = row.sum();
        row /= total;
    });
    out
}

/// Softmax of `values / temperature` written into `weights`; returns the
/// smooth maximum `sum_k w_k v_k`.
pub(crate) fn smooth_max(values: ArrayView1<f64>, temperature: f64, weights: &mut [f64]) -> f64 {
    let max = values.fold(f64::NEG_INFINITY, |m, &v| m.max(v));
    let mut total = 0.0;
    for (w, &v) in weights.iter_mut().zip(values) {
        *w = ((v - max) / temperature).exp();
        total += *w;
    }
    weights.iter_mut().zip(values).map(|(w, &v)| { *w /= total; *w * v }).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array1};

    #[test]
    fn histogram_gap_example() {
        let value = unfairness(&[1, 1, 2, 2], &[1, 2, 2, 2]).unwrap();
        assert!((value - 0.25).abs() < 1e-12);
    }

    #[test]
    fn identical_distributions_are_fair() {
        assert_eq!(unfairness(&[3, 1, 2], &[2, 3, 1, 1, 2, 3]).unwrap(), 0.0);
    }

    #[test]
    fn labels_missing_from_one_side_are_padded() {
        // Class 3 only appears on the second side.
        let value = unfairness(&[1, 1], &[1, 3]).unwrap();
        assert!((value - 0.5).abs() < 1e-12);
    }

    #[test]
    fn empty_sequences_are_rejected() {
        assert!(matches!(unfairness(&[], &[1]), Err(Error::EmptySample(_))));
    }

    #[test]
    fn softmax_rows_sum_to_one() {
        let probs = softmax_rows(&array![[1.0, 2.0, 3.0], [1000.0, 1000.0, -1000.0]]);
        for row in probs.axis_iter(Axis(0)) { assert!((row.sum() - 1.0).abs() < 1e-12) }
        assert!((probs[[1, 0]] - 0.5).abs() < 1e-12);
        assert!(probs[[0, 2]] > probs[[0, 1]] && probs[[0, 1]] > probs[[0, 0]]);
    }

    #[test]
    fn smooth_max_approaches_max_at_low_temperature() {
        let values = Array1::from(vec![0.2, 0.9, 0.5]);
        let mut weights = vec![0.0; 3];
        let cold = smooth_max(values.view(), 1e-3, &mut weights);
        assert!((cold - 0.9).abs() < 1e-6);
        assert!((weights.iter().sum::<f64>() - 1.0).abs() < 1e-12);
        let hot = smooth_max(values.view(), 1e6, &mut weights);
        assert!((hot - values.mean().unwrap()).abs() < 1e-4);
    }
}
