use anyhow::{bail, Context, Result};
use std::path::Path;
use tracing::info;

use crate::cli::{Cli, ConvertArgs};
use crate::commands::load_config;
use crate::io::{read_outlook, snapshot_to_geojson, snapshot_to_geojson_with_hazards, write_json};
use crate::service::ConversionService;

pub fn run(_cli: &Cli, args: &ConvertArgs) -> Result<()> {
    // Assert output path is not stdout
    if args.output == Path::new("-") { bail!("stdout is not supported."); }

    let config = load_config(args.config.as_deref())?;
    let sets = read_outlook(&args.input, &config)?;
    info!(input = %args.input.display(), areas = sets.num_areas(), "loaded outlook document");

    let service = ConversionService::new(config);
    let snapshot = service.recompute(&sets).context("convert outlook")?;

    let value = if args.hazards {
        snapshot_to_geojson_with_hazards(&snapshot)
    } else {
        snapshot_to_geojson(&snapshot)
    };
    write_json(&args.output, &value, args.force)?;

    println!("Wrote {} regions -> {}", snapshot.regions().len(), args.output.display());
    Ok(())
}
