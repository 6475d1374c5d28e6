use anyhow::{bail, Result};
use tracing::info;

use crate::cli::{Cli, ValidateArgs};
use crate::commands::load_config;
use crate::io::{build_sets, read_document};
use crate::nesting::validate_set;

pub fn run(_cli: &Cli, args: &ValidateArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let document = read_document(&args.input)?;
    info!(input = %args.input.display(), areas = document.areas.len(), "validating outlook document");

    let report = build_sets(&document, &config)?;
    for r in &report.rejected {
        println!("area {} ({}, document index {}): {}", r.area, r.hazard, r.index, r.reason);
    }

    // Accepted areas nest by construction; re-check as the service would.
    let mut violations = 0;
    for set in report.sets.iter() {
        if let Err(found) = validate_set(set) {
            for v in &found {
                println!("{}: {v}", set.hazard());
            }
            violations += found.len();
        }
    }

    if let Some(message) = failure_summary(report.rejected.len(), violations, document.areas.len()) {
        bail!(message);
    }
    println!("{} areas nest correctly", document.areas.len());
    Ok(())
}

/// `None` when nothing was rejected and the accepted sets replay cleanly.
fn failure_summary(rejected: usize, violations: usize, total: usize) -> Option<String> {
    match (rejected, violations) {
        (0, 0) => None,
        (r, 0) => Some(format!("{r} of {total} areas rejected")),
        (0, v) => Some(format!("{v} nesting violation(s) among {total} accepted areas")),
        (r, v) => Some(format!("{r} of {total} areas rejected; {v} nesting violation(s) among the {} accepted", total.saturating_sub(r))),
    }
}
