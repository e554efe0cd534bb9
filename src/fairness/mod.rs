mod baseline;
mod binning;
mod groups;
mod metrics;
mod sweep;

pub use baseline::{randomize, BaselineReport, RandomBaseline};
pub use binning::QuantileBinning;
pub use groups::{GroupLabels, ProtectedGroup};
pub use metrics::{demographic_parity, equalized_odds, Cell, Disparity};
pub use sweep::{group_sweep, ring_sweep, ClassifiedObservations, FairnessReport};
