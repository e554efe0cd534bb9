use std::fmt;

use serde::{Deserialize, Serialize};

use crate::smooth::Weighting;
use crate::types::ObservationTable;

/// Per-region scalar signals derived from the observation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionSignal {
    /// Mean observed value (price level).
    Observed,
    /// Mean predicted value.
    Predicted,
    /// Mean relative error `(predicted - observed) / observed`.
    RelativeError,
    /// Number of observations.
    Count,
    /// Mean income level.
    Income,
}

impl RegionSignal {
    /// Per-region values over `num_regions` regions. Regions without a usable
    /// observation are `None`, except for `Count` where they are zero.
    pub fn compute(&self, table: &ObservationTable, num_regions: usize) -> Vec<Option<f64>> {
        match self {
            RegionSignal::Observed => region_means(table, num_regions, |o| Some(o.observed)),
            RegionSignal::Predicted => region_means(table, num_regions, |o| Some(o.predicted)),
            RegionSignal::RelativeError => region_means(table, num_regions, |o| {
                (o.observed != 0.0).then(|| (o.predicted - o.observed) / o.observed)
            }),
            RegionSignal::Count => table.iter()
                .fold(vec![0.0; num_regions], |mut counts, o| { counts[o.region as usize] += 1.0; counts })
                .into_iter()
                .map(Some)
                .collect(),
            RegionSignal::Income => region_means(table, num_regions, |o| o.income),
        }
    }

    /// Weighting used for this signal at the usual call sites.
    pub fn default_weighting(&self) -> Weighting {
        match self {
            RegionSignal::RelativeError => Weighting::squared_error(),
            _ => Weighting::uniform(1.0),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            RegionSignal::Observed => "observed",
            RegionSignal::Predicted => "predicted",
            RegionSignal::RelativeError => "relative_error",
            RegionSignal::Count => "count",
            RegionSignal::Income => "income",
        }
    }
}

impl fmt::Display for RegionSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.name()) }
}

/// Mean of the finite values `value` yields per region.
fn region_means(
    table: &ObservationTable,
    num_regions: usize,
    value: impl Fn(&crate::types::Observation) -> Option<f64>,
) -> Vec<Option<f64>> {
    table.iter()
        .filter_map(|o| value(o).filter(|v| v.is_finite()).map(|v| (o.region as usize, v)))
        .fold(vec![(0.0, 0usize); num_regions], |mut acc, (r, v)| {
            acc[r].0 += v;
            acc[r].1 += 1;
            acc
        })
        .into_iter()
        .map(|(sum, n)| (n > 0).then(|| sum / n as f64))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Observation;

    fn make_table() -> ObservationTable {
        let obs = |id: &str, region: u32, observed: f64, predicted: f64, income: Option<f64>| Observation {
            id: id.into(), region, observed, predicted, group: None, income,
        };
        ObservationTable::new(vec![
            obs("a", 0, 100.0, 110.0, Some(30.0)),
            obs("b", 0, 200.0, 180.0, None),
            obs("c", 2, 50.0, 50.0, Some(20.0)),
            obs("d", 2, 0.0, 10.0, Some(40.0)),
        ])
    }

    #[test]
    fn observed_means_leave_empty_regions_missing() {
        let values = RegionSignal::Observed.compute(&make_table(), 3);
        assert_eq!(values, vec![Some(150.0), None, Some(25.0)]);
    }

    #[test]
    fn relative_error_skips_zero_observed() {
        let values = RegionSignal::RelativeError.compute(&make_table(), 3);
        assert!((values[0].unwrap() - 0.0).abs() < 1e-12); // (+0.1 - 0.1) / 2
        assert_eq!(values[1], None);
        assert_eq!(values[2], Some(0.0));
    }

    #[test]
    fn counts_are_zero_filled() {
        assert_eq!(RegionSignal::Count.compute(&make_table(), 3), vec![Some(2.0), Some(0.0), Some(2.0)]);
    }

    #[test]
    fn income_uses_reported_rows_only() {
        assert_eq!(RegionSignal::Income.compute(&make_table(), 3), vec![Some(30.0), None, Some(30.0)]);
    }

    #[test]
    fn relative_error_uses_squared_weights() {
        assert_eq!(RegionSignal::RelativeError.default_weighting(), Weighting::squared_error());
        assert_eq!(RegionSignal::Count.default_weighting(), Weighting::uniform(1.0));
    }
}
