mod observation;
mod region;

pub use observation::{ensure_unique_ids, Observation, ObservationTable};
pub use region::{Region, RegionIndex};
