pub mod distances;
pub mod fairness;
pub mod mitigate;
pub mod smooth;

use std::path::Path;

use anyhow::{bail, Result};
use spatialfair::{io::csv, AnalysisConfig, DistanceTable, ObservationTable, RegionIndex};

use crate::cli::NeighborhoodArgs;

/// Observations plus the distance table over the same region index.
pub struct Inputs {
    pub regions: RegionIndex,
    pub observations: ObservationTable,
    pub table: DistanceTable,
}

/// Observations are read first so their region order fixes the index;
/// neighborhood files may add regions that carry no observation.
pub fn load_inputs(observations: &Path, neighborhood: &NeighborhoodArgs, config: &AnalysisConfig) -> Result<Inputs> {
    let mut regions = RegionIndex::new();
    println!("[load] reading observations from {}", observations.display());
    let observations = csv::read_observations(observations, &mut regions)?;

    let table = match (&neighborhood.adjacency, &neighborhood.distances) {
        (Some(path), _) => {
            println!("[load] building distances from {} (M = {})", path.display(), config.graph.max_radius);
            let graph = csv::read_adjacency(path, &mut regions)?;
            DistanceTable::build(&graph, config.graph.max_radius)?
        }
        (None, Some(path)) => {
            println!("[load] reading distances from {}", path.display());
            csv::read_distances(path, &mut regions, Some(config.graph.max_radius))?
        }
        (None, None) => bail!("[load] one of --adjacency or --distances is required"),
    };

    Ok(Inputs { regions, observations, table })
}
