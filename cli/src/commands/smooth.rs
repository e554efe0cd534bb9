use std::path::PathBuf;

use anyhow::Result;
use spatialfair::{io::csv, AnalysisConfig, RegionSignal, SpatialSmoother, Weighting};

use crate::cli::SignalArg;

impl From<SignalArg> for RegionSignal {
    fn from(arg: SignalArg) -> Self {
        match arg {
            SignalArg::Observed => RegionSignal::Observed,
            SignalArg::Predicted => RegionSignal::Predicted,
            SignalArg::RelativeError => RegionSignal::RelativeError,
            SignalArg::Count => RegionSignal::Count,
            SignalArg::Income => RegionSignal::Income,
        }
    }
}

pub fn run(config: &AnalysisConfig, args: &crate::cli::SmoothArgs) -> Result<()> {
    let out_path: PathBuf = args.output.clone().unwrap_or("./smoothed.csv".into());
    let inputs = super::load_inputs(&args.observations, &args.neighborhood, config)?;

    let signal = RegionSignal::from(args.signal);
    let radius = args.radius.unwrap_or(config.smoothing.radius);
    // An explicit exponent is symmetric; otherwise the signal picks its own weighting.
    let weighting = match args.exponent {
        Some(p) => Weighting::uniform(p),
        None if signal == RegionSignal::RelativeError => signal.default_weighting(),
        None => config.smoothing.weighting(),
    };

    println!("[smooth] smoothing {signal} over radius {radius} with {weighting:?}");
    let raw = signal.compute(&inputs.observations, inputs.regions.len());
    let smoothed = SpatialSmoother::new(&inputs.table, radius, weighting)?.smooth(&raw)?;
    if !smoothed.missing.is_empty() {
        println!("[smooth] {} regions have no signal within the radius", smoothed.missing.len());
    }

    println!("[smooth] writing {} regions to {}", inputs.regions.len(), out_path.display());
    csv::write_smoothed(&inputs.regions, &raw, &smoothed.values, &out_path)
}
