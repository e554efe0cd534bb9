use ndarray::{Array1, Array2, Array3, Axis};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fairness::GroupLabels;

/// The cell that attains a disparity statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub group: usize,
    pub class: usize,
    /// True class conditioned on (Equalized Odds only).
    pub true_class: Option<usize>,
}

/// A max-aggregated disparity statistic.
///
/// Cells whose conditional proportion is undefined (no observations in the
/// conditioning set) are excluded from the max and counted in
/// `sparse_cells`; when every cell is sparse `value` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Disparity {
    pub value: Option<f64>,
    pub worst: Option<Cell>,
    pub sparse_cells: usize,
}

impl Disparity {
    fn from_cells(cells: impl Iterator<Item = (Cell, Option<f64>)>) -> Self {
        let (worst, sparse_cells) = cells.fold((None::<(Cell, f64)>, 0), |(worst, sparse), (cell, diff)| match diff {
            None => (worst, sparse + 1),
            Some(d) => match worst {
                Some((_, w)) if w >= d => (worst, sparse),
                _ => (Some((cell, d)), sparse),
            },
        });
        Self { value: worst.map(|(_, d)| d), worst: worst.map(|(c, _)| c), sparse_cells }
    }
}

fn validate(classes: &[usize], groups: &GroupLabels, num_classes: usize) -> Result<()> {
    if classes.len() != groups.len() {
        return Err(Error::LengthMismatch { what: "group labels", expected: classes.len(), found: groups.len() });
    }
    if classes.is_empty() {
        return Err(Error::EmptySample("no observations to compare".into()));
    }
    if let Some(&c) = classes.iter().find(|&&c| c >= num_classes) {
        return Err(Error::InvalidConfig(format!("class {c} outside 0..{num_classes}")));
    }
    Ok(())
}

fn log_sparse(statistic: &str, disparity: &Disparity) {
    match disparity.value {
        None => log::warn!("[fairness] {statistic}: every cell is sparse, statistic undefined"),
        Some(_) if disparity.sparse_cells > 0 =>
            log::debug!("[fairness] {statistic}: {} sparse cells excluded", disparity.sparse_cells),
        Some(_) => {}
    }
}

/// Demographic Parity: `max_{a,k} |P(pred = k | A = a) - P(pred = k)|`.
///
/// The population term is over every observation, labelled or not.
pub fn demographic_parity(predicted: &[usize], groups: &GroupLabels, num_classes: usize) -> Result<Disparity> {
    validate(predicted, groups, num_classes)?;

    let mut population = Array1::<f64>::zeros(num_classes);
    let mut counts = Array2::<f64>::zeros((groups.num_groups(), num_classes));
    for (&k, label) in predicted.iter().zip(groups.labels()) {
        population[k] += 1.0;
        if let Some(g) = *label { counts[[g, k]] += 1.0 }
    }
    population /= predicted.len() as f64;
    let sizes = counts.sum_axis(Axis(1));

    let disparity = Disparity::from_cells((0..groups.num_groups()).flat_map(|g| {
        let (counts, population) = (&counts, &population);
        let size = sizes[g];
        (0..num_classes).map(move |k| {
            let cell = Cell { group: g, class: k, true_class: None };
            (cell, (size > 0.0).then(|| (counts[[g, k]] / size - population[k]).abs()))
        })
    }));

    log_sparse("DP", &disparity);
    Ok(disparity)
}

/// Equalized Odds:
/// `max_{a,k',k} |P(pred = k | true = k', A = a) - P(pred = k | true = k')|`.
///
/// Each `(k, k')` cell is an independent difference of conditional
/// proportions; a group with no observations of true class `k'` leaves all
/// cells of that row undefined.
pub fn equalized_odds(truth: &[usize], predicted: &[usize], groups: &GroupLabels, num_classes: usize) -> Result<Disparity> {
    if truth.len() != predicted.len() {
        return Err(Error::LengthMismatch { what: "true classes", expected: predicted.len(), found: truth.len() });
    }
    validate(predicted, groups, num_classes)?;
    validate(truth, groups, num_classes)?;

    let mut population = Array2::<f64>::zeros((num_classes, num_classes));
    let mut counts = Array3::<f64>::zeros((groups.num_groups(), num_classes, num_classes));
    for ((&t, &k), label) in truth.iter().zip(predicted).zip(groups.labels()) {
        population[[t, k]] += 1.0;
        if let Some(g) = *label { counts[[g, t, k]] += 1.0 }
    }
    let population_rows = population.sum_axis(Axis(1));
    let group_rows = counts.sum_axis(Axis(2));

    let disparity = Disparity::from_cells((0..groups.num_groups()).flat_map(|g| {
        let (counts, population, population_rows, group_rows) = (&counts, &population, &population_rows, &group_rows);
        (0..num_classes).flat_map(move |t| (0..num_classes).map(move |k| {
            let cell = Cell { group: g, class: k, true_class: Some(t) };
            let (n_group, n_population) = (group_rows[[g, t]], population_rows[t]);
            let diff = (n_group > 0.0 && n_population > 0.0).then(|| {
                (counts[[g, t, k]] / n_group - population[[t, k]] / n_population).abs()
            });
            (cell, diff)
        }))
    }));

    log_sparse("EO", &disparity);
    Ok(disparity)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_predictor_has_no_disparity() {
        let truth = vec![0, 1, 2, 3, 4, 0, 1, 2, 3, 4];
        let predicted = vec![2; 10];
        let groups = GroupLabels::from_mask(&[true, true, false, false, true, false, true, false, true, false]);

        let dp = demographic_parity(&predicted, &groups, 5).unwrap();
        assert_eq!(dp.value, Some(0.0));
        assert_eq!(dp.sparse_cells, 0);

        let eo = equalized_odds(&truth, &predicted, &groups, 5).unwrap();
        assert_eq!(eo.value, Some(0.0));
    }

    #[test]
    fn dp_picks_the_largest_class_gap() {
        // Population: class 0 = 0.5, class 1 = 0.5. Group: class 0 = 1.0.
        let predicted = vec![0, 0, 1, 1];
        let groups = GroupLabels::from_mask(&[true, true, false, false]);
        let dp = demographic_parity(&predicted, &groups, 2).unwrap();
        assert_eq!(dp.value, Some(0.5));
        assert_eq!(dp.worst, Some(Cell { group: 0, class: 0, true_class: None }));
    }

    #[test]
    fn dp_matching_distribution_is_zero() {
        // 100 observations, 5 classes; the group holds every other row, so its
        // predicted-class distribution equals the population's.
        let predicted = (0..100).map(|i| (i / 2) % 5).collect::<Vec<_>>();
        let mask = (0..100).map(|i| i % 2 == 0).collect::<Vec<_>>();
        let dp = demographic_parity(&predicted, &GroupLabels::from_mask(&mask), 5).unwrap();
        assert!(dp.value.unwrap().abs() < 1e-12);
    }

    #[test]
    fn empty_group_is_sparse_not_zero() {
        let predicted = vec![0, 1, 1];
        let groups = GroupLabels::new(vec![Some(0), Some(0), Some(0)], 2).unwrap();
        let dp = demographic_parity(&predicted, &groups, 2).unwrap();
        assert_eq!(dp.sparse_cells, 2);
        assert!(dp.value.unwrap().abs() < 1e-12);

        let nobody = GroupLabels::from_mask(&[false, false, false]);
        let dp = demographic_parity(&predicted, &nobody, 2).unwrap();
        assert_eq!(dp.value, None);
        assert_eq!(dp.sparse_cells, 2);
    }

    #[test]
    fn eo_is_max_cell_not_average() {
        // True class 0 rows: population predicts 0 for 3/4; the group (rows 0, 1) for 1/2.
        // True class 1 rows: identical behavior inside and outside the group.
        let truth     = vec![0, 0, 0, 0, 1, 1, 1, 1];
        let predicted = vec![0, 1, 0, 0, 1, 1, 1, 1];
        let mask = [true, true, false, false, true, true, false, false];
        let eo = equalized_odds(&truth, &predicted, &GroupLabels::from_mask(&mask), 2).unwrap();
        assert!((eo.value.unwrap() - 0.25).abs() < 1e-12);
        assert_eq!(eo.worst.unwrap().true_class, Some(0));
        assert_eq!(eo.sparse_cells, 0);
    }

    #[test]
    fn eo_skips_true_classes_absent_from_group() {
        let truth     = vec![0, 0, 1, 1];
        let predicted = vec![0, 1, 1, 0];
        let mask = [true, true, false, false];
        let eo = equalized_odds(&truth, &predicted, &GroupLabels::from_mask(&mask), 2).unwrap();
        // Row t = 1 has no group members: both of its cells are sparse.
        assert_eq!(eo.sparse_cells, 2);
        assert_eq!(eo.value, Some(0.0));
    }

    #[test]
    fn statistics_are_non_negative() {
        let truth = (0..60).map(|i| (i * 7) % 3).collect::<Vec<_>>();
        let predicted = (0..60).map(|i| (i * 5 + 1) % 3).collect::<Vec<_>>();
        let mask = (0..60).map(|i| i % 4 == 0).collect::<Vec<_>>();
        let groups = GroupLabels::binary(&mask);
        assert!(demographic_parity(&predicted, &groups, 3).unwrap().value.unwrap() >= 0.0);
        assert!(equalized_odds(&truth, &predicted, &groups, 3).unwrap().value.unwrap() >= 0.0);
    }

    #[test]
    fn invalid_inputs_are_rejected() {
        let groups = GroupLabels::from_mask(&[true, false]);
        assert!(matches!(demographic_parity(&[0], &groups, 2), Err(Error::LengthMismatch { .. })));
        assert!(matches!(demographic_parity(&[0, 2], &groups, 2), Err(Error::InvalidConfig(_))));
        assert!(matches!(equalized_odds(&[0], &[0, 1], &groups, 2), Err(Error::LengthMismatch { .. })));
        let empty = GroupLabels::from_mask(&[]);
        assert!(matches!(demographic_parity(&[], &empty, 2), Err(Error::EmptySample(_))));
    }
}
