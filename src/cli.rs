use clap::{Args, Parser, Subcommand, ValueHint};
use std::path::PathBuf;

use crate::types::Hazard;

/// Categorical outlook CLI (argument schema only)
#[derive(Parser, Debug)]
#[command(name = "outlook", version, about, propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the categorical tier of a hazard probability
    Classify(ClassifyArgs),

    /// Check the nesting of every area in an outlook document
    Validate(ValidateArgs),

    /// Convert an outlook document to a categorical GeoJSON map (forbids stdout)
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// tornado, wind or hail
    pub hazard: Hazard,

    /// Probability literal, e.g. 15% or 15# (significant)
    pub probability: String,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Input outlook document (JSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Engine tolerances (JSON); defaults apply when absent
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input outlook document (JSON)
    #[arg(value_hint = ValueHint::FilePath)]
    pub input: PathBuf,

    /// Output GeoJSON file (must be a file path; "-" is rejected)
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    pub output: PathBuf,

    /// Overwrite if the file exists
    #[arg(long)]
    pub force: bool,

    /// Also write the tier-tagged polygons of each hazard
    #[arg(long)]
    pub hazards: bool,

    /// Engine tolerances (JSON); defaults apply when absent
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
}
