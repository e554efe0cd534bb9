//! Analysis configuration loaded from TOML. Every key is optional.
//!
//! ```toml
//! [graph]
//! max_radius = 30
//!
//! [smoothing]
//! radius = 1
//! exponent = 1.0
//!
//! [binning]
//! classes = 5
//!
//! [baseline]
//! draws = 1
//!
//! [mitigation]
//! temperature = 0.01
//! time_limit_secs = 60
//! ```

use std::{path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::mitigate::MitigationParams;
use crate::smooth::Weighting;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub graph: GraphConfig,
    pub smoothing: SmoothingConfig,
    pub binning: BinningConfig,
    pub baseline: BaselineConfig,
    pub mitigation: MitigationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GraphConfig {
    /// Truncation radius `M` of the distance table.
    pub max_radius: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SmoothingConfig {
    /// Neighborhood radius `m`.
    pub radius: u32,
    /// Distance-decay exponent `p`.
    pub exponent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BinningConfig {
    /// Number of quantile classes `K`.
    pub classes: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaselineConfig {
    pub draws: usize,
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MitigationConfig {
    pub temperature: f64,
    pub noise: f64,
    pub penalty: f64,
    pub max_iter: usize,
    pub tolerance: f64,
    pub time_limit_secs: Option<f64>,
    pub seed: Option<u64>,
}

impl Default for GraphConfig {
    fn default() -> Self { Self { max_radius: 30 } }
}

impl Default for SmoothingConfig {
    fn default() -> Self { Self { radius: 1, exponent: 1.0 } }
}

impl Default for BinningConfig {
    fn default() -> Self { Self { classes: 5 } }
}

impl Default for BaselineConfig {
    fn default() -> Self { Self { draws: 1, seed: None } }
}

impl Default for MitigationConfig {
    fn default() -> Self {
        let params = MitigationParams::default();
        Self {
            temperature: params.temperature,
            noise: params.noise,
            penalty: params.penalty,
            max_iter: params.max_iter,
            tolerance: params.tolerance,
            time_limit_secs: None,
            seed: None,
        }
    }
}

impl SmoothingConfig {
    #[inline] pub fn weighting(&self) -> Weighting { Weighting::uniform(self.exponent) }
}

impl MitigationConfig {
    /// Solver parameters; range checks happen in `DpMitigator::new`.
    pub fn params(&self) -> Result<MitigationParams> {
        let time_limit = self.time_limit_secs
            .map(Duration::try_from_secs_f64)
            .transpose()
            .context("[config] mitigation.time_limit_secs must be a non-negative number of seconds")?;
        Ok(MitigationParams {
            temperature: self.temperature,
            noise: self.noise,
            penalty: self.penalty,
            max_iter: self.max_iter,
            tolerance: self.tolerance,
            time_limit,
            seed: self.seed,
        })
    }
}

impl AnalysisConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("[config] Failed to parse analysis configuration")
    }

    /// Load from `path`, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else { return Ok(Self::default()) };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("[config] Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("[config] Invalid config file: {}", path.display()))?;
        log::debug!("[config] loaded {config:?}");
        Ok(config)
    }
}
