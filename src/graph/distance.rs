use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::graph::AdjacencyGraph;

/// Minimum hop distances for every pair of regions related within a
/// maximum radius `M`, stored per source in CSR format sorted by target.
///
/// Pairs beyond `M` are absent: `distance` returns `None` for them, which
/// callers must read as "unrelated within M", never as a large distance.
/// Every region is its own neighbor at distance 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistanceTable {
    max_radius: u32,
    offsets: Vec<u32>,
    targets: Vec<u32>,
    hops: Vec<u32>,
}

impl DistanceTable {
    /// Breadth-first search from every region, truncated at `max_radius` hops.
    pub fn build(graph: &AdjacencyGraph, max_radius: u32) -> Result<Self> {
        if max_radius < 1 {
            return Err(Error::InvalidConfig(format!("max_radius must be at least 1, got {max_radius}")));
        }

        let rows = (0..graph.node_count())
            .into_par_iter()
            .map(|source| bfs_within(graph, source, max_radius))
            .collect::<Vec<_>>();

        let table = Self::from_sorted_rows(max_radius, rows);
        log::debug!("[graph::distance] built table for {} regions, {} related pairs within {max_radius} hops",
            table.node_count(), table.pair_count());
        Ok(table)
    }

    /// Rebuild a table from persisted `(from, to, hops)` triples over
    /// `num_nodes` regions. Self pairs are asserted at distance 0 whatever
    /// the input says; rows beyond `max_radius` are rejected. Every row is
    /// mirrored, so a pair listed in one direction only stays symmetric.
    pub fn from_triples(num_nodes: usize, max_radius: u32, triples: impl IntoIterator<Item = (u32, u32, u32)>) -> Result<Self> {
        if max_radius < 1 {
            return Err(Error::InvalidConfig(format!("max_radius must be at least 1, got {max_radius}")));
        }

        let mut rows: Vec<Vec<(u32, u32)>> = (0..num_nodes as u32).map(|i| vec![(i, 0)]).collect();
        for (from, to, hops) in triples {
            for index in [from, to] {
                if index as usize >= num_nodes { return Err(Error::UnknownRegion(format!("index {index}"))) }
            }
            if from == to { continue }
            if hops == 0 || hops > max_radius {
                return Err(Error::InvalidConfig(format!(
                    "distance {hops} between {from} and {to} is outside 1..={max_radius}")));
            }
            rows[from as usize].push((to, hops));
            rows[to as usize].push((from, hops));
        }

        for row in &mut rows {
            row.sort_unstable();
            // Keep the smallest distance when a pair is listed twice.
            row.dedup_by_key(|&mut (to, _)| to);
        }

        Ok(Self::from_sorted_rows(max_radius, rows))
    }

    fn from_sorted_rows(max_radius: u32, rows: Vec<Vec<(u32, u32)>>) -> Self {
        Self {
            max_radius,
            offsets: std::iter::once(0u32).chain(
                rows.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect(),
            targets: rows.iter().flatten().map(|&(to, _)| to).collect(),
            hops: rows.iter().flatten().map(|&(_, d)| d).collect(),
        }
    }

    /// The truncation radius `M`.
    #[inline] pub fn max_radius(&self) -> u32 { self.max_radius }

    /// Number of regions covered by the table.
    #[inline] pub fn node_count(&self) -> usize { self.offsets.len() - 1 }

    /// Number of related ordered pairs, self pairs included.
    #[inline] pub fn pair_count(&self) -> usize { self.targets.len() }

    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Minimum hop distance from `a` to `b`, or `None` when unrelated within `M`.
    pub fn distance(&self, a: usize, b: usize) -> Option<u32> {
        let range = self.range(a);
        self.targets[range.clone()]
            .binary_search(&(b as u32))
            .ok()
            .map(|k| self.hops[range.start + k])
    }

    /// All `(target, hops)` pairs related to `node`, including itself at 0.
    #[inline]
    pub fn row(&self, node: usize) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.range(node).map(move |k| (self.targets[k] as usize, self.hops[k]))
    }

    /// Targets within `radius` hops of `node` (inclusive), with their distance.
    #[inline]
    pub fn within(&self, node: usize, radius: u32) -> impl Iterator<Item = (usize, u32)> + '_ {
        self.row(node).filter(move |&(_, d)| d <= radius)
    }

    /// Sorted regions within `radius` hops of `center`, the center included.
    pub fn ring(&self, center: usize, radius: u32) -> Vec<u32> {
        self.within(center, radius).map(|(j, _)| j as u32).collect()
    }

    /// All related `(from, to, hops)` triples in source order.
    pub fn triples(&self) -> impl Iterator<Item = (u32, u32, u32)> + '_ {
        (0..self.node_count()).flat_map(move |i| self.row(i).map(move |(j, d)| (i as u32, j as u32, d)))
    }
}

/// Level-synchronous BFS from `source`. The source is seeded as visited so it
/// can never be recorded at a positive distance; its distance-0 entry is
/// added separately.
fn bfs_within(graph: &AdjacencyGraph, source: usize, max_radius: u32) -> Vec<(u32, u32)> {
    let mut visited = vec![false; graph.node_count()];
    visited[source] = true;

    let mut found = vec![(source as u32, 0)];
    let mut frontier = vec![source];
    for hops in 1..=max_radius {
        let next = frontier.iter()
            .flat_map(|&u| graph.edges(u))
            .filter(|&v| !std::mem::replace(&mut visited[v], true))
            .collect::<Vec<_>>();
        if next.is_empty() { break }
        found.extend(next.iter().map(|&v| (v as u32, hops)));
        frontier = next;
    }

    found.sort_unstable();
    found
}
