//! File interchange, organized by format.
//!
//! - `csv` - observations, adjacency edge lists, distance tables, scores and
//!   mitigation outputs
//! - `json` - serialized reports

pub mod csv;
pub mod json;
