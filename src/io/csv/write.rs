//! CSV writing operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result, ensure};
use polars::{frame::DataFrame, io::SerWriter, prelude::{Column, CsvWriter}};

use crate::graph::DistanceTable;
use crate::mitigate::MitigationResult;
use crate::types::{ensure_unique_ids, RegionIndex};

/// Write a DataFrame to a CSV file.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("[io::csv::write] Failed to create CSV file: {}", path.display()))?;
    CsvWriter::new(file)
        .finish(df)
        .with_context(|| format!("[io::csv::write] Failed to write CSV to {:?}", path))
}

/// Write a distance table as `from,to,distance`, one row per related ordered
/// pair including each region's self pair at distance 0.
pub fn write_distances(table: &DistanceTable, regions: &RegionIndex, path: &Path) -> Result<()> {
    ensure!(table.node_count() == regions.len(),
        "[io::csv::write] Distance table covers {} regions, index has {}", table.node_count(), regions.len());

    let (pairs, hops): (Vec<_>, Vec<_>) = table.triples()
        .map(|(from, to, d)| ((regions.code(from).to_string(), regions.code(to).to_string()), d))
        .unzip();
    let (from, to): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

    let mut df = DataFrame::new(vec![
        Column::new("from".into(), from),
        Column::new("to".into(), to),
        Column::new("distance".into(), hops),
    ])?;
    write_csv(&mut df, path)
}

/// Write a raw and a smoothed per-region signal as `region,raw,smoothed`.
/// Missing values are written as empty fields.
pub fn write_smoothed(regions: &RegionIndex, raw: &[Option<f64>], smoothed: &[Option<f64>], path: &Path) -> Result<()> {
    ensure!(raw.len() == regions.len() && smoothed.len() == regions.len(),
        "[io::csv::write] Signals must have one value per region ({})", regions.len());

    let mut df = DataFrame::new(vec![
        Column::new("region".into(), regions.iter().map(|r| r.code.to_string()).collect::<Vec<_>>()),
        Column::new("raw".into(), raw.to_vec()),
        Column::new("smoothed".into(), smoothed.to_vec()),
    ])?;
    write_csv(&mut df, path)
}

/// Mitigated predictions for one named protected-group scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutput {
    pub scenario: String,
    pub ids: Vec<String>,
    pub result: MitigationResult,
}

/// Write mitigation outputs in long format, `id,scenario,class,prob_1..prob_K`.
///
/// Each scenario must list every identifier exactly once; a duplicate fails
/// with `IdentifierCollision` naming the offending keys before anything is
/// written.
pub fn write_mitigation(outputs: &[ScenarioOutput], path: &Path) -> Result<()> {
    let num_classes = outputs.first().map_or(0, |o| o.result.probabilities.ncols());
    for output in outputs {
        ensure!(output.ids.len() == output.result.classes.len(),
            "[io::csv::write] Scenario '{}' has {} ids for {} predictions",
            output.scenario, output.ids.len(), output.result.classes.len());
        ensure!(output.result.probabilities.ncols() == num_classes,
            "[io::csv::write] Scenario '{}' has {} classes, expected {num_classes}",
            output.scenario, output.result.probabilities.ncols());
        ensure_unique_ids(&output.scenario, &output.ids)?;
    }

    let ids = outputs.iter().flat_map(|o| o.ids.iter().cloned()).collect::<Vec<_>>();
    let scenarios = outputs.iter()
        .flat_map(|o| std::iter::repeat_n(o.scenario.clone(), o.ids.len()))
        .collect::<Vec<_>>();
    let classes = outputs.iter()
        .flat_map(|o| o.result.classes.iter().map(|&c| c as u32))
        .collect::<Vec<_>>();

    let mut columns = vec![
        Column::new("id".into(), ids),
        Column::new("scenario".into(), scenarios),
        Column::new("class".into(), classes),
    ];
    columns.extend((0..num_classes).map(|k| {
        let probs = outputs.iter()
            .flat_map(|o| o.result.probabilities.column(k).to_vec())
            .collect::<Vec<_>>();
        Column::new(format!("prob_{}", k + 1).into(), probs)
    }));

    let mut df = DataFrame::new(columns)?;
    log::info!("[io::csv::write] {} mitigated rows across {} scenarios", df.height(), outputs.len());
    write_csv(&mut df, path)
}
