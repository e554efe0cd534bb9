mod mitigator;
mod solver;
mod unfairness;

pub use mitigator::{Corrections, DpMitigator, MitigationParams, MitigationResult};
pub use solver::Convergence;
pub use unfairness::{softmax_rows, unfairness};
