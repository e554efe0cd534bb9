use std::path::PathBuf;

/// Spatial fairness diagnostics (argument schema only)
#[derive(clap::Parser, Debug)]
#[command(name = "spatialfair", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Analysis configuration (TOML); flags override its values
    #[arg(short, long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Build the hop-distance table from an adjacency edge list
    Distances(DistancesArgs),

    /// Smooth a per-region signal over its hop neighborhood
    Smooth(SmoothArgs),

    /// Demographic parity and equalized odds for spatial groups
    Fairness(FairnessArgs),

    /// Post-process class scores toward demographic parity
    Mitigate(MitigateArgs),
}

/// Where region neighborhoods come from.
#[derive(clap::Args, Debug)]
#[group(required = true, multiple = false)]
pub struct NeighborhoodArgs {
    /// Adjacency edge list (`region,neighbor`)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub adjacency: Option<PathBuf>,

    /// Precomputed distance table (`from,to,distance`)
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub distances: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct DistancesArgs {
    /// Adjacency edge list (`region,neighbor`)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub adjacency: PathBuf,

    /// Observations, to include regions without neighbors
    #[arg(long, value_hint = clap::ValueHint::FilePath)]
    pub observations: Option<PathBuf>,

    /// Truncation radius M
    #[arg(short = 'M', long)]
    pub max_radius: Option<u32>,

    /// Output table, defaults to "./distances.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
pub enum SignalArg {
    Observed,
    Predicted,
    RelativeError,
    Count,
    Income,
}

#[derive(clap::Args, Debug)]
pub struct SmoothArgs {
    /// Observations (`id,region,observed,predicted[,group,income,parent]`)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub observations: PathBuf,

    #[command(flatten)]
    pub neighborhood: NeighborhoodArgs,

    /// Per-region signal to smooth
    #[arg(short, long, value_enum, default_value = "observed")]
    pub signal: SignalArg,

    /// Neighborhood radius m
    #[arg(short, long)]
    pub radius: Option<u32>,

    /// Distance-decay exponent p (numerator and denominator)
    #[arg(short, long)]
    pub exponent: Option<f64>,

    /// Output table, defaults to "./smoothed.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct FairnessArgs {
    /// Observations (`id,region,observed,predicted[,group,income,parent]`)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub observations: PathBuf,

    #[command(flatten)]
    pub neighborhood: NeighborhoodArgs,

    /// Region code at the center of the ring sweep
    #[arg(long)]
    pub center: Option<String>,

    /// Largest ring radius, defaults to M
    #[arg(long)]
    pub rings: Option<u32>,

    /// Also evaluate one group per administrative parent
    #[arg(long)]
    pub by_parent: bool,

    /// Number of quantile classes K
    #[arg(short = 'k', long)]
    pub classes: Option<usize>,

    /// Random-baseline draws per group (0 disables)
    #[arg(long)]
    pub draws: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Output report, defaults to "./fairness.json"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct MitigateArgs {
    /// Observations (`id,region,observed,predicted[,group,income,parent]`)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub observations: PathBuf,

    /// Class scores (`id,score_1..score_K`)
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub scores: PathBuf,

    /// Group values to mitigate against, one scenario each; defaults to every
    /// value when no ring or parent scenarios are requested
    #[arg(short, long)]
    pub scenario: Vec<String>,

    /// Adjacency edge list for ring scenarios (`region,neighbor`)
    #[arg(long, requires = "center", conflicts_with = "distances", value_hint = clap::ValueHint::FilePath)]
    pub adjacency: Option<PathBuf>,

    /// Precomputed distance table for ring scenarios (`from,to,distance`)
    #[arg(long, requires = "center", value_hint = clap::ValueHint::FilePath)]
    pub distances: Option<PathBuf>,

    /// Region code at the center of the ring scenarios
    #[arg(long)]
    pub center: Option<String>,

    /// Largest ring radius, defaults to M
    #[arg(long, requires = "center")]
    pub rings: Option<u32>,

    /// One scenario per administrative parent
    #[arg(long)]
    pub by_parent: bool,

    /// Smooth-maximum temperature c
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Penalty weight on the corrections
    #[arg(long)]
    pub penalty: Option<f64>,

    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Wall-clock limit per scenario, in seconds
    #[arg(long)]
    pub time_limit: Option<f64>,

    #[arg(long)]
    pub seed: Option<u64>,

    /// Output table, defaults to "./mitigated.csv"
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub output: Option<PathBuf>,
}
