use anyhow::Result;

use crate::cli::{ClassifyArgs, Cli};
use crate::risk::classify_literal;

pub fn run(_cli: &Cli, args: &ClassifyArgs) -> Result<()> {
    let tier = classify_literal(args.hazard, &args.probability)?;
    println!("{tier}");
    Ok(())
}
