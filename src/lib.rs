#![doc = "Spatial disparity and fairness diagnostics over region-indexed predictions"]
pub mod config;
mod error;
pub mod fairness;
pub mod geometry;
pub mod graph;
pub mod io;
pub mod mitigate;
pub mod smooth;
pub mod types;

#[doc(inline)]
pub use error::{Error, Result};

#[doc(inline)]
pub use config::AnalysisConfig;

#[doc(inline)]
pub use graph::{AdjacencyGraph, DistanceTable, HopRelation};

#[doc(inline)]
pub use smooth::{RegionSignal, SpatialSmoother, Weighting};

#[doc(inline)]
pub use fairness::{demographic_parity, equalized_odds, Disparity, GroupLabels, QuantileBinning};

#[doc(inline)]
pub use mitigate::{unfairness, DpMitigator, MitigationParams, MitigationResult};

#[doc(inline)]
pub use types::{Observation, ObservationTable, Region, RegionIndex};
