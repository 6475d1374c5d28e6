use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use outlook::cli::{Cli, Commands};
use outlook::commands::{classify, convert, validate};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    match &cli.command {
        Commands::Classify(args) => classify::run(&cli, args),
        Commands::Validate(args) => validate::run(&cli, args),
        Commands::Convert(args) => convert::run(&cli, args),
    }
}
