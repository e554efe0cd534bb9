//! CSV reading operations.

use std::{fs::File, path::Path};

use anyhow::{Context, Result, ensure};
use ndarray::Array2;
use polars::{frame::DataFrame, io::SerReader, prelude::{CsvReadOptions, DataType}};

use crate::graph::{AdjacencyGraph, DistanceTable};
use crate::types::{ensure_unique_ids, Observation, ObservationTable, Region, RegionIndex};

/// Reads a CSV file from `path` with every column as a string, so region
/// codes keep their leading zeros. Numeric columns are cast on access.
pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let file = File::open(path)
        .with_context(|| format!("[io::csv::read] Failed to open CSV file: {}", path.display()))?;
    CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .into_reader_with_file_handle(file)
        .finish()
        .with_context(|| format!("[io::csv::read] Failed to read CSV from {:?}", path))
}

fn has_column(df: &DataFrame, name: &str) -> bool {
    df.get_column_names().iter().any(|c| c.as_str() == name)
}

fn optional_strings(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<String>>>> {
    if !has_column(df, name) { return Ok(None) }
    let column = df.column(name)?.cast(&DataType::String)?;
    Ok(Some(column.str()?.into_iter().map(|v| v.map(str::to_string)).collect()))
}

fn optional_floats(df: &DataFrame, name: &str) -> Result<Option<Vec<Option<f64>>>> {
    if !has_column(df, name) { return Ok(None) }
    let column = df.column(name)?.cast(&DataType::Float64)?;
    Ok(Some(column.f64()?.into_iter().collect()))
}

fn required<T>(column: Option<Vec<Option<T>>>, name: &str) -> Result<Vec<T>> {
    column
        .with_context(|| format!("[io::csv::read] Missing required column '{name}'"))?
        .into_iter()
        .enumerate()
        .map(|(row, v)| v.with_context(|| format!("[io::csv::read] Missing or non-numeric '{name}' at row {}", row + 1)))
        .collect()
}

fn strings(df: &DataFrame, name: &str) -> Result<Vec<String>> { required(optional_strings(df, name)?, name) }

fn floats(df: &DataFrame, name: &str) -> Result<Vec<f64>> { required(optional_floats(df, name)?, name) }

/// Looks up `code`, registering it as a new region when unseen.
fn intern(regions: &mut RegionIndex, code: &str) -> Result<u32> {
    match regions.get(code) {
        Some(i) => Ok(i),
        None => Ok(regions.push(Region::new(code))?),
    }
}

/// Read observations with columns `id,region,observed,predicted` and the
/// optional columns `group`, `income` and `parent` (administrative parent of
/// the row's region). Region codes not yet in `regions` are registered in
/// order of first appearance.
pub fn read_observations(path: &Path, regions: &mut RegionIndex) -> Result<ObservationTable> {
    let df = read_csv(path)?;
    let ids = strings(&df, "id")?;
    let codes = strings(&df, "region")?;
    let observed = floats(&df, "observed")?;
    let predicted = floats(&df, "predicted")?;
    let groups = optional_strings(&df, "group")?;
    let incomes = optional_floats(&df, "income")?;
    let parents = optional_strings(&df, "parent")?;

    ensure_unique_ids("observations", &ids)?;

    let rows = (0..df.height())
        .map(|row| {
            let region = intern(regions, &codes[row])?;
            if let Some(parent) = parents.as_ref().and_then(|p| p[row].as_deref()) {
                regions.set_parent(region, parent);
            }
            Ok::<_, anyhow::Error>(Observation {
                id: ids[row].as_str().into(),
                region,
                observed: observed[row],
                predicted: predicted[row],
                group: groups.as_ref().and_then(|g| g[row].as_deref()).map(Into::into),
                income: incomes.as_ref().and_then(|v| v[row]),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    log::info!("[io::csv::read] {} observations over {} regions from {}", rows.len(), regions.len(), path.display());
    Ok(ObservationTable::new(rows))
}

/// Read an adjacency edge list with columns `region,neighbor` and build the
/// symmetric graph over every region registered so far. Codes not yet in
/// `regions` are registered.
pub fn read_adjacency(path: &Path, regions: &mut RegionIndex) -> Result<AdjacencyGraph> {
    let df = read_csv(path)?;
    let from = strings(&df, "region")?;
    let to = strings(&df, "neighbor")?;

    let edges = from.iter().zip(&to)
        .map(|(a, b)| Ok::<_, anyhow::Error>((intern(regions, a)?, intern(regions, b)?)))
        .collect::<Result<Vec<_>>>()?;

    let graph = AdjacencyGraph::from_edges(regions.len(), &edges)?;
    log::info!("[io::csv::read] adjacency with {} regions and {} edges", graph.node_count(), graph.edge_count());
    Ok(graph)
}

/// Read a persisted distance table with columns `from,to,distance`. Codes not
/// yet in `regions` are registered. An explicit `max_radius` truncates the
/// table, dropping rows farther than it; otherwise the largest listed
/// distance is used.
pub fn read_distances(path: &Path, regions: &mut RegionIndex, max_radius: Option<u32>) -> Result<DistanceTable> {
    let df = read_csv(path)?;
    let from = strings(&df, "from")?;
    let to = strings(&df, "to")?;
    let column = df.column("distance")
        .context("[io::csv::read] Missing required column 'distance'")?
        .cast(&DataType::UInt32)?;
    let hops = required(Some(column.u32()?.into_iter().collect()), "distance")?;

    let triples = (0..df.height())
        .map(|row| Ok::<_, anyhow::Error>((intern(regions, &from[row])?, intern(regions, &to[row])?, hops[row])))
        .collect::<Result<Vec<_>>>()?;

    let max_radius = max_radius.unwrap_or_else(|| hops.iter().copied().max().unwrap_or(1).max(1));
    let listed = triples.len();
    let triples = triples.into_iter().filter(|&(_, _, d)| d <= max_radius).collect::<Vec<_>>();
    if triples.len() < listed {
        log::info!("[io::csv::read] dropped {} rows beyond radius {max_radius}", listed - triples.len());
    }
    Ok(DistanceTable::from_triples(regions.len(), max_radius, triples)?)
}

/// Read per-observation class scores with columns `id,score_1,...,score_K`.
pub fn read_scores(path: &Path) -> Result<(Vec<String>, Array2<f64>)> {
    let df = read_csv(path)?;
    let ids = strings(&df, "id")?;

    let num_classes = (1..).take_while(|k| has_column(&df, &format!("score_{k}"))).count();
    ensure!(num_classes >= 2, "[io::csv::read] Expected columns score_1..score_K with K >= 2 in {:?}", path);

    let mut scores = Array2::zeros((df.height(), num_classes));
    for k in 0..num_classes {
        let values = floats(&df, &format!("score_{}", k + 1))?;
        scores.column_mut(k).iter_mut().zip(values).for_each(|(s, v)| *s = v);
    }

    ensure_unique_ids("scores", &ids)?;
    Ok((ids, scores))
}
