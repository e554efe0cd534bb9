use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fairness::{demographic_parity, equalized_odds, Disparity, GroupLabels, ProtectedGroup, QuantileBinning};
use crate::graph::DistanceTable;
use crate::types::ObservationTable;

/// DP and EO for one protected group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FairnessReport {
    pub members: usize,
    pub dp: Disparity,
    pub eo: Disparity,
}

/// Observations discretized once by a fixed binning, shared read-only by
/// every group evaluation.
#[derive(Debug, Clone)]
pub struct ClassifiedObservations {
    truth: Vec<usize>,
    predicted: Vec<usize>,
    regions: Vec<u32>,
    num_classes: usize,
}

impl ClassifiedObservations {
    pub fn new(table: &ObservationTable, binning: &QuantileBinning) -> Self {
        Self {
            truth: binning.classify_all(&table.observed()),
            predicted: binning.classify_all(&table.predicted()),
            regions: table.regions(),
            num_classes: binning.num_classes(),
        }
    }

    #[inline] pub fn truth(&self) -> &[usize] { &self.truth }

    #[inline] pub fn predicted(&self) -> &[usize] { &self.predicted }

    #[inline] pub fn num_classes(&self) -> usize { self.num_classes }

    /// Same observations with a different predicted axis (e.g. mitigated classes).
    pub fn with_predicted(&self, predicted: Vec<usize>) -> Result<Self> {
        if predicted.len() != self.truth.len() {
            return Err(Error::LengthMismatch { what: "predicted classes", expected: self.truth.len(), found: predicted.len() });
        }
        Ok(Self { predicted, ..self.clone() })
    }

    /// Labels observations whose region belongs to `group`.
    pub fn labels(&self, group: &ProtectedGroup) -> GroupLabels {
        GroupLabels::from_mask(&self.regions.iter().map(|&r| group.contains(r)).collect::<Vec<_>>())
    }

    pub fn report(&self, group: &ProtectedGroup) -> Result<FairnessReport> {
        let labels = self.labels(group);
        Ok(FairnessReport {
            members: labels.sizes()[0],
            dp: demographic_parity(&self.predicted, &labels, self.num_classes)?,
            eo: equalized_odds(&self.truth, &self.predicted, &labels, self.num_classes)?,
        })
    }
}

/// Reports for concentric rings `0..=max_radius` around `center`, one per radius.
pub fn ring_sweep(
    observations: &ClassifiedObservations,
    table: &DistanceTable,
    center: usize,
    max_radius: u32,
) -> Result<BTreeMap<u32, FairnessReport>> {
    let reports = (0..=max_radius)
        .into_par_iter()
        .map(|radius| Ok::<_, Error>((radius, observations.report(&ProtectedGroup::ring(table, center, radius))?)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    log::info!("[fairness::sweep] evaluated {} rings around region {center}", reports.len());
    Ok(reports)
}

/// Reports for a list of named groups (e.g. one per administrative parent).
pub fn group_sweep(
    observations: &ClassifiedObservations,
    groups: &[ProtectedGroup],
) -> Result<BTreeMap<String, FairnessReport>> {
    let reports = groups
        .par_iter()
        .map(|group| Ok::<_, Error>((group.name().to_string(), observations.report(group)?)))
        .collect::<Result<BTreeMap<_, _>>>()?;

    log::info!("[fairness::sweep] evaluated {} groups", reports.len());
    Ok(reports)
}
