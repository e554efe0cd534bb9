use std::{collections::{BTreeSet, HashMap}, path::PathBuf};

use anyhow::{Context, Result};
use ndarray::ArrayView2;
use spatialfair::{
    fairness::ProtectedGroup,
    io::csv::{self, ScenarioOutput},
    unfairness, AnalysisConfig, DpMitigator, Error, RegionIndex,
};

use crate::cli::NeighborhoodArgs;

pub fn run(config: &AnalysisConfig, args: &crate::cli::MitigateArgs) -> Result<()> {
    let out_path: PathBuf = args.output.clone().unwrap_or("./mitigated.csv".into());

    let mut params = config.mitigation.params()?;
    if let Some(v) = args.temperature { params.temperature = v }
    if let Some(v) = args.penalty { params.penalty = v }
    if let Some(v) = args.max_iter { params.max_iter = v }
    if let Some(v) = args.time_limit { params.time_limit = Some(std::time::Duration::try_from_secs_f64(v)?) }
    if args.seed.is_some() { params.seed = args.seed }
    log::debug!("[mitigate] parameters {params:?}");
    let mitigator = DpMitigator::new(params)?;

    // Distances are only needed for ring scenarios.
    let (regions, observations, table) = if args.center.is_some() {
        let neighborhood = NeighborhoodArgs { adjacency: args.adjacency.clone(), distances: args.distances.clone() };
        let inputs = super::load_inputs(&args.observations, &neighborhood, config)?;
        (inputs.regions, inputs.observations, Some(inputs.table))
    } else {
        println!("[mitigate] reading observations from {}", args.observations.display());
        let mut regions = RegionIndex::new();
        let observations = csv::read_observations(&args.observations, &mut regions)?;
        (regions, observations, None)
    };
    let row_of = observations.iter().enumerate()
        .map(|(i, o)| (o.id.as_ref(), i))
        .collect::<HashMap<_, _>>();

    println!("[mitigate] reading scores from {}", args.scores.display());
    let (ids, scores) = csv::read_scores(&args.scores)?;
    // Observation row behind each score row.
    let rows = ids.iter()
        .map(|id| row_of.get(id.as_str()).copied()
            .with_context(|| format!("[mitigate] score row '{id}' has no matching observation")))
        .collect::<Result<Vec<_>>>()?;
    let align = |indicator: Vec<bool>| rows.iter().map(|&r| indicator[r]).collect::<Vec<_>>();

    let mut groups = Vec::new();
    if let (Some(code), Some(table)) = (&args.center, &table) {
        let center = regions.require(code)? as usize;
        let max_radius = args.rings.unwrap_or(table.max_radius()).min(table.max_radius());
        println!("[mitigate] ring scenarios around {code} up to radius {max_radius}");
        groups.extend((0..=max_radius).map(|r| ProtectedGroup::ring(table, center, r)));
    }
    if args.by_parent {
        groups.extend(ProtectedGroup::by_parent(&regions));
    }

    let values: Vec<String> = if args.scenario.is_empty() && groups.is_empty() {
        observations.iter().filter_map(|o| o.group.as_deref()).collect::<BTreeSet<_>>().into_iter().map(str::to_string).collect()
    } else {
        args.scenario.clone()
    };

    let mut scenarios = groups.iter()
        .map(|group| (group.name().to_string(), align(group.indicator(&observations))))
        .collect::<Vec<_>>();
    scenarios.extend(values.into_iter().map(|value| {
        let sides = align(observations.iter().map(|o| o.group.as_deref() == Some(value.as_str())).collect());
        (value, sides)
    }));

    let outputs = mitigate_scenarios(&mitigator, &ids, scores.view(), scenarios)?;
    println!("[mitigate] writing {} scenarios to {}", outputs.len(), out_path.display());
    csv::write_mitigation(&outputs, &out_path)
}

/// Corrects `scores` once per `(name, sides)` scenario. A scenario that
/// leaves one side empty is skipped with a warning; any other failure aborts.
pub fn mitigate_scenarios(
    mitigator: &DpMitigator,
    ids: &[String],
    scores: ArrayView2<f64>,
    scenarios: Vec<(String, Vec<bool>)>,
) -> Result<Vec<ScenarioOutput>> {
    let before = scores.rows().into_iter()
        .map(|row| row.iter().enumerate().fold((0, f64::NEG_INFINITY), |b, (k, &v)| if v > b.1 { (k, v) } else { b }).0 + 1)
        .collect::<Vec<_>>();

    let mut outputs = Vec::with_capacity(scenarios.len());
    for (scenario, sides) in scenarios {
        println!("[mitigate] scenario '{scenario}': {} of {} observations protected",
            sides.iter().filter(|&&s| s).count(), sides.len());

        let result = match mitigator.mitigate(scores, &sides) {
            Ok(result) => result,
            Err(Error::DegenerateGroup(reason)) => {
                log::warn!("[mitigate] skipping scenario '{scenario}': {reason}");
                continue;
            }
            Err(e) => return Err(e).with_context(|| format!("[mitigate] scenario '{scenario}'")),
        };
        if !result.corrections.converged() {
            println!("[mitigate] scenario '{scenario}' did not converge ({:?})", result.corrections.convergence);
        }

        let split = |classes: &[usize]| -> Result<f64> {
            let (a, b): (Vec<usize>, Vec<usize>) = (
                classes.iter().zip(&sides).filter(|(_, s)| !**s).map(|(c, _)| *c).collect(),
                classes.iter().zip(&sides).filter(|(_, s)| **s).map(|(c, _)| *c).collect(),
            );
            Ok(unfairness(&a, &b)?)
        };
        println!("[mitigate] scenario '{scenario}': unfairness {:.4} -> {:.4}", split(&before)?, split(&result.classes)?);

        outputs.push(ScenarioOutput { scenario, ids: ids.to_vec(), result });
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use spatialfair::MitigationParams;

    #[test]
    fn degenerate_scenario_is_skipped() {
        let mut scores = Array2::zeros((6, 2));
        for i in 0..6 {
            let u = (i as f64 + 0.5) / 6.0;
            scores[[i, 0]] = 1.0 - u;
            scores[[i, 1]] = u;
        }
        let ids = (0..6).map(|i| format!("o{i}")).collect::<Vec<_>>();
        let scenarios = vec![
            ("everyone".to_string(), vec![true; 6]),
            ("half".to_string(), vec![true, false, true, false, true, false]),
        ];

        let mitigator = DpMitigator::new(MitigationParams { seed: Some(3), ..Default::default() }).unwrap();
        let outputs = mitigate_scenarios(&mitigator, &ids, scores.view(), scenarios).unwrap();
        assert_eq!(outputs.len(), 1);
        assert_eq!(outputs[0].scenario, "half");
        assert_eq!(outputs[0].result.classes.len(), 6);
    }
}
