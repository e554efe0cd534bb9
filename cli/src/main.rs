mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{distances, fairness, mitigate, smooth};

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filters = std::env::var("RUST_LOG").unwrap_or_else(|_| default.to_string());
    pretty_env_logger::formatted_builder().parse_filters(&filters).init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    let config = spatialfair::AnalysisConfig::load(cli.config.as_deref())?;

    match &cli.command {
        Commands::Distances(args) => distances::run(&config, args),
        Commands::Smooth(args) => smooth::run(&config, args),
        Commands::Fairness(args) => fairness::run(&config, args),
        Commands::Mitigate(args) => mitigate::run(&config, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
