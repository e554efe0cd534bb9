use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::graph::DistanceTable;

/// Decay exponents of the inverse-distance weight `1 / (1 + hops)^p`.
///
/// The numerator and denominator sums may use different exponents; the
/// relative-error smoothing weights the numerator with `p = 2` but still
/// divides by the `p = 1` weight sum. Callers choose per call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weighting {
    pub numerator: f64,
    pub denominator: f64,
}

impl Weighting {
    /// Same exponent on both sums: a proper weighted average.
    pub fn uniform(exponent: f64) -> Self { Self { numerator: exponent, denominator: exponent } }

    /// Squared-distance weights over a linear weight sum.
    pub fn squared_error() -> Self { Self { numerator: 2.0, denominator: 1.0 } }

    #[inline]
    fn weight(hops: u32, exponent: f64) -> f64 { (1.0 + hops as f64).powf(-exponent) }
}

impl Default for Weighting {
    fn default() -> Self { Self::uniform(1.0) }
}

/// Output of one smoothing pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Smoothed {
    /// Smoothed value per region; `None` where no region within the radius
    /// had a defined signal.
    pub values: Vec<Option<f64>>,
    /// Regions whose smoothed value is missing, in index order.
    pub missing: Vec<u32>,
}

/// Inverse-distance-weighted local averaging over a `DistanceTable`.
#[derive(Debug, Clone, Copy)]
pub struct SpatialSmoother<'a> {
    table: &'a DistanceTable,
    radius: u32,
    weighting: Weighting,
}

impl<'a> SpatialSmoother<'a> {
    /// `radius` is the cutoff `m` in hops (inclusive) and must not exceed the
    /// table's `M`; exponents must be finite and non-negative.
    pub fn new(table: &'a DistanceTable, radius: u32, weighting: Weighting) -> Result<Self> {
        if radius > table.max_radius() {
            return Err(Error::InvalidConfig(format!(
                "smoothing radius {radius} exceeds the distance table radius {}", table.max_radius())));
        }
        for exponent in [weighting.numerator, weighting.denominator] {
            if !exponent.is_finite() || exponent < 0.0 {
                return Err(Error::InvalidConfig(format!("decay exponent must be finite and >= 0, got {exponent}")));
            }
        }
        Ok(Self { table, radius, weighting })
    }

    #[inline] pub fn radius(&self) -> u32 { self.radius }

    #[inline] pub fn weighting(&self) -> Weighting { self.weighting }

    /// Smooth one per-region signal. Regions with a missing (or non-finite)
    /// signal drop out of both sums for every target.
    pub fn smooth(&self, signal: &[Option<f64>]) -> Result<Smoothed> {
        if signal.len() != self.table.node_count() {
            return Err(Error::LengthMismatch {
                what: "signal",
                expected: self.table.node_count(),
                found: signal.len(),
            });
        }

        let values = (0..signal.len())
            .into_par_iter()
            .map(|i| self.smooth_at(i, signal))
            .collect::<Vec<_>>();

        let missing = values.iter().enumerate()
            .filter_map(|(i, v)| v.is_none().then_some(i as u32))
            .collect::<Vec<_>>();
        if !missing.is_empty() {
            log::warn!("[smooth] {} of {} regions have no defined signal within {} hops",
                missing.len(), values.len(), self.radius);
        }

        Ok(Smoothed { values, missing })
    }

    fn smooth_at(&self, i: usize, signal: &[Option<f64>]) -> Option<f64> {
        let Weighting { numerator, denominator } = self.weighting;
        let (num, den, count) = self.table.within(i, self.radius)
            .filter_map(|(j, hops)| signal[j].filter(|v| v.is_finite()).map(|v| (v, hops)))
            .fold((0.0, 0.0, 0usize), |(num, den, count), (v, hops)| (
                num + Weighting::weight(hops, numerator) * v,
                den + Weighting::weight(hops, denominator),
                count + 1,
            ));
        (count > 0).then(|| num / den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::AdjacencyGraph;

    fn make_line_table(n: usize, max_radius: u32) -> DistanceTable {
        let edges = (1..n as u32).map(|i| (i - 1, i)).collect::<Vec<_>>();
        DistanceTable::build(&AdjacencyGraph::from_edges(n, &edges).unwrap(), max_radius).unwrap()
    }

    fn defined(values: &[f64]) -> Vec<Option<f64>> { values.iter().copied().map(Some).collect() }

    #[test]
    fn line_graph_center_is_weighted_average() {
        let table = make_line_table(5, 30);
        let smoother = SpatialSmoother::new(&table, 1, Weighting::uniform(1.0)).unwrap();
        let out = smoother.smooth(&defined(&[10.0, 20.0, 30.0, 40.0, 50.0])).unwrap();
        assert!((out.values[2].unwrap() - 30.0).abs() < 1e-12);
        // Endpoint: (10 * 1 + 20 * 0.5) / 1.5
        assert!((out.values[0].unwrap() - 20.0 / 1.5).abs() < 1e-12);
        assert!(out.missing.is_empty());

        // Squared weights over the linear weight sum: (30 + 20 * 0.25 + 40 * 0.25) / 2
        let smoother = SpatialSmoother::new(&table, 1, Weighting::squared_error()).unwrap();
        let out = smoother.smooth(&defined(&[10.0, 20.0, 30.0, 40.0, 50.0])).unwrap();
        assert!((out.values[2].unwrap() - 22.5).abs() < 1e-12);
    }

    #[test]
    fn line_graph_center_with_skewed_signal() {
        let table = make_line_table(5, 30);
        let smoother = SpatialSmoother::new(&table, 1, Weighting::uniform(1.0)).unwrap();
        let out = smoother.smooth(&defined(&[0.0, 20.0, 30.0, 40.0, 0.0])).unwrap();
        // (30 * 1 + 20 * 0.5 + 40 * 0.5) / (1 + 0.5 + 0.5)
        assert!((out.values[2].unwrap() - 60.0 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_radius_returns_signal_unchanged() {
        let table = make_line_table(4, 3);
        let signal = vec![Some(1.5), None, Some(-2.0), Some(7.0)];
        for p in [0.0, 1.0, 2.0] {
            let out = SpatialSmoother::new(&table, 0, Weighting::uniform(p)).unwrap().smooth(&signal).unwrap();
            assert_eq!(out.values, signal);
            assert_eq!(out.missing, vec![1]);
        }
    }

    #[test]
    fn missing_neighbors_are_excluded_not_zeroed() {
        let table = make_line_table(3, 2);
        let smoother = SpatialSmoother::new(&table, 1, Weighting::uniform(1.0)).unwrap();
        let out = smoother.smooth(&[Some(10.0), None, Some(f64::NAN)]).unwrap();
        assert_eq!(out.values[0], Some(10.0));
        assert_eq!(out.values[1], Some(10.0));
        assert_eq!(out.values[2], None);
        assert_eq!(out.missing, vec![2]);
    }

    #[test]
    fn weighted_average_stays_within_bounds() {
        let table = make_line_table(6, 5);
        let signal = defined(&[3.0, -1.0, 8.0, 2.5, 0.0, 6.0]);
        for p in [0.0, 0.5, 1.0, 3.0] {
            for m in 0..=5 {
                let out = SpatialSmoother::new(&table, m, Weighting::uniform(p)).unwrap().smooth(&signal).unwrap();
                for v in out.values.iter().map(|v| v.unwrap()) {
                    assert!((-1.0..=8.0).contains(&v), "p={p} m={m} value {v}");
                }
            }
        }
    }

    #[test]
    fn asymmetric_exponents_divide_by_linear_weight_sum() {
        let table = make_line_table(3, 2);
        let smoother = SpatialSmoother::new(&table, 1, Weighting::squared_error()).unwrap();
        let out = smoother.smooth(&defined(&[4.0, 2.0, 8.0])).unwrap();
        // (2 * 1 + 4 * 0.25 + 8 * 0.25) / (1 + 0.5 + 0.5)
        assert!((out.values[1].unwrap() - 5.0 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let table = make_line_table(3, 2);
        assert!(matches!(SpatialSmoother::new(&table, 3, Weighting::default()), Err(Error::InvalidConfig(_))));
        assert!(matches!(SpatialSmoother::new(&table, 1, Weighting::uniform(-1.0)), Err(Error::InvalidConfig(_))));
        let smoother = SpatialSmoother::new(&table, 1, Weighting::default()).unwrap();
        assert!(matches!(smoother.smooth(&[Some(1.0)]), Err(Error::LengthMismatch { expected: 3, found: 1, .. })));
    }
}
