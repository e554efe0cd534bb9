mod distance;
mod graph;
mod hops;

pub use distance::DistanceTable;
pub use graph::AdjacencyGraph;
pub use hops::HopRelation;
