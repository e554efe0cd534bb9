mod signal;
mod smoother;

pub use signal::RegionSignal;
pub use smoother::{Smoothed, SpatialSmoother, Weighting};
