use std::sync::Arc;

use ahash::AHashMap;

use crate::error::{Error, Result};

/// One transaction record, immutable once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub id: Arc<str>,
    pub region: u32,            // Dense index into the `RegionIndex`
    pub observed: f64,          // Observed outcome (price per unit area)
    pub predicted: f64,         // Outcome predicted by the external model
    pub group: Option<Arc<str>>, // Administrative group, if reported on the row
    pub income: Option<f64>,    // Income level of the row's area
}

/// Row-oriented observation table; many observations map to one region.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    rows: Vec<Observation>,
}

impl ObservationTable {
    pub fn new(rows: Vec<Observation>) -> Self { Self { rows } }

    #[inline] pub fn len(&self) -> usize { self.rows.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.rows.is_empty() }

    #[inline] pub fn rows(&self) -> &[Observation] { &self.rows }

    #[inline] pub fn iter(&self) -> impl Iterator<Item = &Observation> + '_ { self.rows.iter() }

    pub fn ids(&self) -> Vec<Arc<str>> { self.rows.iter().map(|o| o.id.clone()).collect() }

    pub fn observed(&self) -> Vec<f64> { self.rows.iter().map(|o| o.observed).collect() }

    pub fn predicted(&self) -> Vec<f64> { self.rows.iter().map(|o| o.predicted).collect() }

    pub fn regions(&self) -> Vec<u32> { self.rows.iter().map(|o| o.region).collect() }
}

/// Fail with `IdentifierCollision` if any identifier occurs more than once.
/// Offending keys are reported in order of first appearance.
pub fn ensure_unique_ids<S: AsRef<str>>(scenario: &str, ids: &[S]) -> Result<()> {
    let mut seen: AHashMap<&str, usize> = AHashMap::with_capacity(ids.len());
    let mut duplicates = Vec::new();
    for id in ids {
        let count = seen.entry(id.as_ref()).or_insert(0);
        *count += 1;
        if *count == 2 { duplicates.push(id.as_ref().to_string()) }
    }

    if duplicates.is_empty() { Ok(()) }
    else { Err(Error::IdentifierCollision { scenario: scenario.to_string(), keys: duplicates }) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(id: &str, region: u32, observed: f64, predicted: f64) -> Observation {
        Observation { id: id.into(), region, observed, predicted, group: None, income: None }
    }

    #[test]
    fn columns_follow_row_order() {
        let table = ObservationTable::new(vec![
            obs("a", 2, 10.0, 11.0),
            obs("b", 0, 20.0, 19.0),
            obs("c", 2, 30.0, 35.0),
        ]);
        assert_eq!(table.len(), 3);
        assert_eq!(table.regions(), vec![2, 0, 2]);
        assert_eq!(table.observed(), vec![10.0, 20.0, 30.0]);
        assert_eq!(table.predicted(), vec![11.0, 19.0, 35.0]);
        assert_eq!(table.ids().iter().map(|id| id.as_ref()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn unique_ids_pass() {
        assert!(ensure_unique_ids("base", &["1", "2", "3"]).is_ok());
    }

    #[test]
    fn duplicate_ids_are_reported_once_each() {
        let err = ensure_unique_ids("ring_2", &["1", "2", "1", "3", "2", "1"]).unwrap_err();
        match err {
            Error::IdentifierCollision { scenario, keys } => {
                assert_eq!(scenario, "ring_2");
                assert_eq!(keys, vec!["1", "2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
