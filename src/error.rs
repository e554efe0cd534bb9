use std::fmt;

/// Recoverable conditions surfaced by the analysis components.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A configuration value is out of its valid range (e.g. `M < 1`, `K < 2`).
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A protected-group indicator selects none or all of the observations.
    #[error("degenerate group: {0}")]
    DegenerateGroup(String),

    /// Duplicate observation identifiers within a single output scenario.
    #[error("identifier collision in scenario '{scenario}': {}", DisplayKeys(.keys))]
    IdentifierCollision { scenario: String, keys: Vec<String> },

    /// A region code that is not part of the region index.
    #[error("unknown region '{0}'")]
    UnknownRegion(String),

    /// Two parallel inputs that must have the same length do not.
    #[error("length mismatch: {what} has {found} entries, expected {expected}")]
    LengthMismatch { what: &'static str, expected: usize, found: usize },

    /// An empirical distribution was requested over no samples.
    #[error("empty sample: {0}")]
    EmptySample(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Prints at most a handful of offending keys.
struct DisplayKeys<'a>(&'a [String]);

impl fmt::Display for DisplayKeys<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const SHOWN: usize = 5;
        let head = self.0.iter().take(SHOWN).map(String::as_str).collect::<Vec<_>>().join(", ");
        if self.0.len() > SHOWN {
            write!(f, "{head} (+{} more)", self.0.len() - SHOWN)
        } else {
            write!(f, "{head}")
        }
    }
}
