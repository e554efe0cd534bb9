use crate::error::{Error, Result};

/// The 1-hop region adjacency relation, an undirected graph in compressed
/// sparse row format. Neighbor lists are sorted and never contain the node
/// itself; self-distance is handled by `DistanceTable`, not by the graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    size: usize,
    offsets: Vec<u32>,
    edges: Vec<u32>,
}

impl AdjacencyGraph {
    /// Construct a graph from per-node adjacency lists.
    /// Lists are sorted, deduplicated and stripped of self-loops, and every
    /// edge is mirrored so the relation is symmetric.
    pub fn from_adjacency_lists(lists: &[Vec<u32>]) -> Result<Self> {
        let n = lists.len();
        let mut mirrored = vec![Vec::new(); n];
        for (i, nbrs) in lists.iter().enumerate() {
            for &j in nbrs {
                if j as usize >= n { return Err(Error::UnknownRegion(format!("index {j}"))) }
                if j as usize == i { continue }
                mirrored[i].push(j);
                mirrored[j as usize].push(i as u32);
            }
        }
        mirrored.iter_mut().for_each(|nbrs| { nbrs.sort_unstable(); nbrs.dedup(); });

        Ok(Self {
            size: n,
            offsets: std::iter::once(0u32).chain(
                mirrored.iter()
                    .map(|v| v.len() as u32)
                    .scan(0u32, |acc, len| {*acc += len; Some(*acc)})
            ).collect::<Vec<u32>>(),
            edges: mirrored.into_iter().flatten().collect(),
        })
    }

    /// Construct a graph from an undirected edge list over `num_nodes` nodes.
    pub fn from_edges(num_nodes: usize, edges: &[(u32, u32)]) -> Result<Self> {
        let mut lists = vec![Vec::new(); num_nodes];
        for &(i, j) in edges {
            if i as usize >= num_nodes { return Err(Error::UnknownRegion(format!("index {i}"))) }
            lists[i as usize].push(j);
        }
        Self::from_adjacency_lists(&lists)
    }

    /// Construct a graph by evaluating a symmetric intersection predicate
    /// once per unordered pair of distinct nodes.
    pub fn from_predicate(num_nodes: usize, intersects: impl Fn(usize, usize) -> bool) -> Self {
        let lists = (0..num_nodes)
            .map(|i| (i + 1..num_nodes).filter(|&j| intersects(i, j)).map(|j| j as u32).collect())
            .collect::<Vec<Vec<u32>>>();

        // Indices are in range by construction.
        Self::from_adjacency_lists(&lists).unwrap_or_default()
    }

    /// Get the number of nodes in the graph.
    #[inline] pub fn node_count(&self) -> usize { self.size }

    /// Get the number of directed edge entries (twice the undirected edge count).
    #[inline] pub fn edge_count(&self) -> usize { self.edges.len() }

    /// Get the range of edges for a given node.
    #[inline]
    fn range(&self, node: usize) -> std::ops::Range<usize> {
        self.offsets[node] as usize .. self.offsets[node + 1] as usize
    }

    /// Get the degree (number of neighbors) of a given node.
    #[inline] pub fn degree(&self, node: usize) -> usize { self.range(node).len() }

    /// Get the sorted neighbors of a given node.
    #[inline] pub fn neighbors(&self, node: usize) -> &[u32] { &self.edges[self.range(node)] }

    /// Get an iterator over the neighbors of a given node.
    #[inline]
    pub fn edges(&self, node: usize) -> impl Iterator<Item = usize> + '_ {
        self.neighbors(node).iter().map(|&v| v as usize)
    }

    /// Returns `true` if `a` and `b` share a boundary (binary search).
    #[inline]
    pub fn contains(&self, a: usize, b: usize) -> bool {
        self.neighbors(a).binary_search(&(b as u32)).is_ok()
    }

    /// Check that every edge has its mirror.
    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| self.edges(i).all(|j| self.contains(j, i)))
    }
}
