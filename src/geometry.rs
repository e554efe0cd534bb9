use geo::{BoundingRect, Intersects, MultiPolygon, Rect};
use rstar::{RTree, RTreeObject, AABB};

use crate::graph::AdjacencyGraph;

#[derive(Debug, Clone)]
struct BoundingBox {
    idx: usize, // Index of corresponding MultiPolygon in geoms
    bbox: Rect<f64>,
}

impl RTreeObject for BoundingBox {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Region polygons with an R-tree over their bounding boxes, used only to
/// answer "do these two regions' boundaries touch".
#[derive(Debug, Clone)]
pub struct RegionGeometry {
    geoms: Vec<MultiPolygon<f64>>,
    rtree: RTree<BoundingBox>,
}

impl RegionGeometry {
    /// Index a vector of MultiPolygons; empty geometries are kept but never intersect.
    pub fn new(polygons: Vec<MultiPolygon<f64>>) -> Self {
        Self {
            rtree: RTree::bulk_load(polygons.iter().enumerate()
                .filter_map(|(i, poly)| poly.bounding_rect().map(|bbox| BoundingBox { idx: i, bbox }))
                .collect()),
            geoms: polygons,
        }
    }

    #[inline] pub fn len(&self) -> usize { self.geoms.len() }

    #[inline] pub fn is_empty(&self) -> bool { self.geoms.is_empty() }

    /// Symmetric intersection predicate: any shared point counts.
    pub fn intersects(&self, i: usize, j: usize) -> bool {
        self.geoms[i].intersects(&self.geoms[j])
    }

    /// Build the 1-hop adjacency relation, testing only bounding-box candidates.
    pub fn adjacency(&self) -> AdjacencyGraph {
        let lists = (0..self.geoms.len())
            .map(|i| {
                let Some(rect) = self.geoms[i].bounding_rect() else { return Vec::new() };
                let search = AABB::from_corners(rect.min().into(), rect.max().into());
                self.rtree.locate_in_envelope_intersecting(&search)
                    .map(|cand| cand.idx)
                    .filter(|&j| j > i && self.intersects(i, j))
                    .map(|j| j as u32)
                    .collect()
            })
            .collect::<Vec<Vec<u32>>>();

        let graph = AdjacencyGraph::from_adjacency_lists(&lists).unwrap_or_default();
        log::info!("[geometry] {} regions, {} adjacencies", graph.node_count(), graph.edge_count() / 2);
        graph
    }
}
