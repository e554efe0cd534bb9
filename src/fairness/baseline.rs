use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fairness::{demographic_parity, equalized_odds, GroupLabels, QuantileBinning};

/// Null-model reference: predictions replaced by uniform draws over the
/// empirical predicted range, classified with the fixed observed-axis
/// binning. Gives the noise floor real disparities are judged against.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomBaseline {
    pub draws: usize,
    pub seed: Option<u64>,
}

/// Statistics for each random draw, plus their means over defined values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaselineReport {
    pub dp: Vec<Option<f64>>,
    pub eo: Vec<Option<f64>>,
    pub mean_dp: Option<f64>,
    pub mean_eo: Option<f64>,
}

impl RandomBaseline {
    pub fn new(draws: usize, seed: Option<u64>) -> Self { Self { draws, seed } }

    pub fn evaluate(
        &self,
        predicted: &[f64],
        truth: &[usize],
        binning: &QuantileBinning,
        groups: &GroupLabels,
    ) -> Result<BaselineReport> {
        if self.draws == 0 {
            return Err(Error::InvalidConfig("baseline needs at least one draw".into()));
        }
        let mut rng = self.seed.map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);

        let (dp, eo) = (0..self.draws)
            .map(|_| {
                let classes = binning.classify_all(&randomize(predicted, &mut rng)?);
                let dp = demographic_parity(&classes, groups, binning.num_classes())?.value;
                let eo = equalized_odds(truth, &classes, groups, binning.num_classes())?.value;
                Ok::<_, Error>((dp, eo))
            })
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .unzip::<_, _, Vec<_>, Vec<_>>();

        log::debug!("[fairness::baseline] {} draws evaluated", self.draws);
        Ok(BaselineReport { mean_dp: mean_defined(&dp), mean_eo: mean_defined(&eo), dp, eo })
    }
}

/// One uniform draw per row over `[min, max]` of the finite predictions.
pub fn randomize<R: Rng + ?Sized>(predicted: &[f64], rng: &mut R) -> Result<Vec<f64>> {
    let (lo, hi) = predicted.iter().copied().filter(|v| v.is_finite())
        .fold(None, |acc: Option<(f64, f64)>, v| Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v)))))
        .ok_or_else(|| Error::EmptySample("no finite predictions to bound the random baseline".into()))?;

    Ok(predicted.iter().map(|_| if lo < hi { rng.random_range(lo..=hi) } else { lo }).collect())
}

fn mean_defined(values: &[Option<f64>]) -> Option<f64> {
    let defined = values.iter().flatten().collect::<Vec<_>>();
    (!defined.is_empty()).then(|| defined.iter().copied().sum::<f64>() / defined.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draws_stay_within_predicted_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let draws = randomize(&[3.0, 8.0, f64::NAN, 5.0], &mut rng).unwrap();
        assert_eq!(draws.len(), 4);
        assert!(draws.iter().all(|v| (3.0..=8.0).contains(v)));
    }

    #[test]
    fn constant_predictions_draw_the_constant() {
        let mut rng = StdRng::seed_from_u64(7);
        assert_eq!(randomize(&[2.0, 2.0], &mut rng).unwrap(), vec![2.0, 2.0]);
        assert!(matches!(randomize(&[f64::NAN], &mut rng), Err(Error::EmptySample(_))));
    }

    #[test]
    fn seeded_baseline_is_reproducible() {
        let observed = (0..200).map(f64::from).collect::<Vec<_>>();
        let binning = QuantileBinning::fit(&observed, 4).unwrap();
        let truth = binning.classify_all(&observed);
        let mask = (0..200).map(|i| i < 50).collect::<Vec<_>>();
        let groups = GroupLabels::from_mask(&mask);

        let baseline = RandomBaseline::new(3, Some(42));
        let a = baseline.evaluate(&observed, &truth, &binning, &groups).unwrap();
        let b = baseline.evaluate(&observed, &truth, &binning, &groups).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.dp.len(), 3);
        assert!(a.mean_dp.unwrap() > 0.0);
    }

    #[test]
    fn baseline_eo_shrinks_with_sample_size() {
        // Random predictions are independent of the truth and of the group, so
        // the gap to the population only reflects sampling noise.
        let eo_at = |n: usize| {
            let observed = (0..n).map(|i| i as f64).collect::<Vec<_>>();
            let binning = QuantileBinning::fit(&observed, 3).unwrap();
            let truth = binning.classify_all(&observed);
            let mask = (0..n).map(|i| i % 2 == 0).collect::<Vec<_>>();
            RandomBaseline::new(5, Some(1))
                .evaluate(&observed, &truth, &binning, &GroupLabels::from_mask(&mask))
                .unwrap()
                .mean_eo
                .unwrap()
        };
        let (small, large) = (eo_at(60), eo_at(30_000));
        assert!(large < small, "large-sample EO {large} should be below small-sample EO {small}");
        assert!(large < 0.05);
    }

    #[test]
    fn zero_draws_is_invalid() {
        let binning = QuantileBinning::from_cutoffs(vec![0.5]).unwrap();
        let groups = GroupLabels::from_mask(&[true]);
        let err = RandomBaseline::new(0, None).evaluate(&[0.0], &[0], &binning, &groups).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
    }
}
