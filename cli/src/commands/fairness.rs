use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Result;
use serde::Serialize;
use spatialfair::{
    fairness::{group_sweep, ring_sweep, BaselineReport, ClassifiedObservations, FairnessReport, ProtectedGroup, RandomBaseline},
    io::json,
    AnalysisConfig, QuantileBinning,
};

#[derive(Serialize)]
struct FairnessOutput {
    classes: usize,
    cutoffs: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    center: Option<String>,
    rings: BTreeMap<u32, FairnessReport>,
    groups: BTreeMap<String, FairnessReport>,
    baseline: BTreeMap<String, BaselineReport>,
}

pub fn run(config: &AnalysisConfig, args: &crate::cli::FairnessArgs) -> Result<()> {
    let out_path: PathBuf = args.output.clone().unwrap_or("./fairness.json".into());
    let inputs = super::load_inputs(&args.observations, &args.neighborhood, config)?;

    let classes = args.classes.unwrap_or(config.binning.classes);
    let binning = QuantileBinning::fit(&inputs.observations.observed(), classes)?;
    let classified = ClassifiedObservations::new(&inputs.observations, &binning);
    println!("[fairness] {} observations binned into {classes} classes", inputs.observations.len());

    let mut groups = Vec::new();
    let mut rings = BTreeMap::new();
    if let Some(code) = &args.center {
        let center = inputs.regions.require(code)? as usize;
        let max_radius = args.rings.unwrap_or(inputs.table.max_radius()).min(inputs.table.max_radius());
        println!("[fairness] ring sweep around {code} up to radius {max_radius}");
        rings = ring_sweep(&classified, &inputs.table, center, max_radius)?;
        groups.extend((0..=max_radius).map(|r| ProtectedGroup::ring(&inputs.table, center, r)));
    }

    let mut by_parent = BTreeMap::new();
    if args.by_parent {
        let parents = ProtectedGroup::by_parent(&inputs.regions);
        println!("[fairness] evaluating {} administrative groups", parents.len());
        by_parent = group_sweep(&classified, &parents)?;
        groups.extend(parents);
    }

    let draws = args.draws.unwrap_or(config.baseline.draws);
    let mut baseline = BTreeMap::new();
    if draws > 0 {
        println!("[fairness] random baseline with {draws} draws for {} groups", groups.len());
        let sampler = RandomBaseline::new(draws, args.seed.or(config.baseline.seed));
        let predicted = inputs.observations.predicted();
        for group in &groups {
            let report = sampler.evaluate(&predicted, classified.truth(), &binning, &classified.labels(group))?;
            baseline.insert(group.name().to_string(), report);
        }
    }

    let output = FairnessOutput {
        classes,
        cutoffs: binning.cutoffs().to_vec(),
        center: args.center.clone(),
        rings,
        groups: by_parent,
        baseline,
    };

    println!("[fairness] writing report to {}", out_path.display());
    json::write_json(&out_path, &output)
}
