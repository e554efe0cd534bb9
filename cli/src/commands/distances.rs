use std::path::PathBuf;

use anyhow::Result;
use spatialfair::{io::csv, AnalysisConfig, DistanceTable, RegionIndex};

pub fn run(config: &AnalysisConfig, args: &crate::cli::DistancesArgs) -> Result<()> {
    let out_path: PathBuf = args.output.clone().unwrap_or("./distances.csv".into());
    let max_radius = args.max_radius.unwrap_or(config.graph.max_radius);

    let mut regions = RegionIndex::new();
    if let Some(path) = &args.observations {
        println!("[distances] registering regions from {}", path.display());
        csv::read_observations(path, &mut regions)?;
    }

    println!("[distances] reading adjacency from {}", args.adjacency.display());
    let graph = csv::read_adjacency(&args.adjacency, &mut regions)?;

    println!("[distances] computing hop distances up to M = {max_radius}");
    let table = DistanceTable::build(&graph, max_radius)?;

    println!("[distances] writing {} pairs to {}", table.pair_count(), out_path.display());
    csv::write_distances(&table, &regions, &out_path)
}
