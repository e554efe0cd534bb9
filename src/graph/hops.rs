use ndarray::Array2;

use crate::error::{Error, Result};
use crate::graph::{AdjacencyGraph, DistanceTable};

/// Dense r-hop relations for r = 1..=M, built by composing the (r-1)-hop
/// relation with the 1-hop relation and thresholding.
///
/// The composed relations hold strictly positive distances only: the
/// diagonal is cleared after every step, so a walk that returns to its
/// source never counts as a self relation. O(n^3) per step; use
/// `DistanceTable::build` for anything but small region sets.
#[derive(Debug, Clone)]
pub struct HopRelation {
    max_radius: u32,
    relations: Vec<Array2<bool>>, // relations[r - 1] = related within r hops
}

impl HopRelation {
    pub fn compose(graph: &AdjacencyGraph, max_radius: u32) -> Result<Self> {
        if max_radius < 1 {
            return Err(Error::InvalidConfig(format!("max_radius must be at least 1, got {max_radius}")));
        }

        let n = graph.node_count();
        let adjacency = Array2::from_shape_fn((n, n), |(i, j)| graph.contains(i, j) as u32);

        let mut relations = vec![adjacency.mapv(|v| v > 0)];
        let mut current = adjacency.clone();
        for r in 2..=max_radius {
            let step = current.dot(&adjacency);
            let next = Array2::from_shape_fn((n, n), |(i, j)| {
                (i != j && (current[[i, j]] > 0 || step[[i, j]] > 0)) as u32
            });
            if next == current {
                log::debug!("[graph::hops] relation saturated at radius {}", r - 1);
                break;
            }
            relations.push(next.mapv(|v| v > 0));
            current = next;
        }

        Ok(Self { max_radius, relations })
    }

    #[inline] pub fn max_radius(&self) -> u32 { self.max_radius }

    /// Whether `a` and `b` are related within `radius` hops (`radius >= 1`).
    /// Radii past saturation reuse the last computed relation.
    pub fn related(&self, radius: u32, a: usize, b: usize) -> Result<bool> {
        if radius < 1 || radius > self.max_radius {
            return Err(Error::InvalidConfig(format!("radius {radius} outside 1..={}", self.max_radius)));
        }
        let last = &self.relations[(radius as usize).min(self.relations.len()) - 1];
        for index in [a, b] {
            if index >= last.nrows() { return Err(Error::UnknownRegion(format!("index {index}"))) }
        }
        Ok(last[[a, b]])
    }

    /// Smallest radius at which each pair first becomes related, with the
    /// self distance asserted separately.
    pub fn to_distance_table(&self) -> Result<DistanceTable> {
        let n = self.relations.first().map_or(0, |m| m.nrows());
        let triples = (0..n).flat_map(|i| (0..n).map(move |j| (i, j)))
            .filter(|&(i, j)| i != j)
            .filter_map(|(i, j)| {
                self.relations.iter()
                    .position(|m| m[[i, j]])
                    .map(|r| (i as u32, j as u32, r as u32 + 1))
            })
            .collect::<Vec<_>>();

        DistanceTable::from_triples(n, self.max_radius, triples)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_grid_graph(w: usize, h: usize) -> AdjacencyGraph {
        let at = |x: usize, y: usize| (y * w + x) as u32;
        let mut edges = Vec::new();
        for y in 0..h {
            for x in 0..w {
                if x + 1 < w { edges.push((at(x, y), at(x + 1, y))) }
                if y + 1 < h { edges.push((at(x, y), at(x, y + 1))) }
            }
        }
        AdjacencyGraph::from_edges(w * h, &edges).unwrap()
    }

    #[test]
    fn composition_matches_bfs() {
        let graph = make_grid_graph(4, 3);
        let dense = HopRelation::compose(&graph, 4).unwrap();
        let bfs = DistanceTable::build(&graph, 4).unwrap();
        assert_eq!(dense.to_distance_table().unwrap(), bfs);
    }

    #[test]
    fn distance_is_the_minimal_radius() {
        let graph = make_grid_graph(3, 3);
        let dense = HopRelation::compose(&graph, 4).unwrap();
        let table = DistanceTable::build(&graph, 4).unwrap();
        for i in 0..9 {
            for (j, d) in table.row(i).filter(|&(j, _)| j != i) {
                assert!(dense.related(d, i, j).unwrap(), "({i}, {j}) not related at {d}");
                if d > 1 { assert!(!dense.related(d - 1, i, j).unwrap(), "({i}, {j}) related before {d}") }
            }
        }
    }

    #[test]
    fn self_loops_never_leak_into_composition() {
        // Walk 0 -> 1 -> 0 has length 2; the diagonal must stay empty.
        let graph = AdjacencyGraph::from_edges(2, &[(0, 1)]).unwrap();
        let dense = HopRelation::compose(&graph, 3).unwrap();
        for r in 1..=3 {
            assert!(!dense.related(r, 0, 0).unwrap());
            assert!(!dense.related(r, 1, 1).unwrap());
        }
        assert_eq!(dense.to_distance_table().unwrap().distance(0, 0), Some(0));
    }

    #[test]
    fn relations_grow_monotonically() {
        let graph = make_grid_graph(5, 1);
        let dense = HopRelation::compose(&graph, 6).unwrap();
        for r in 2..=6 {
            for i in 0..5 {
                for j in 0..5 {
                    if dense.related(r - 1, i, j).unwrap() { assert!(dense.related(r, i, j).unwrap()) }
                }
            }
        }
        assert!(dense.related(4, 0, 4).unwrap());
        assert!(!dense.related(3, 0, 4).unwrap());
    }

    #[test]
    fn related_rejects_bad_queries() {
        let dense = HopRelation::compose(&make_grid_graph(3, 1), 2).unwrap();
        assert!(matches!(dense.related(0, 0, 1), Err(Error::InvalidConfig(_))));
        assert!(matches!(dense.related(3, 0, 1), Err(Error::InvalidConfig(_))));
        assert!(matches!(dense.related(1, 0, 3), Err(Error::UnknownRegion(_))));
    }
}
