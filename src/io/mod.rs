//! JSON document input and GeoJSON output.

mod document;
mod geojson;

use std::{fs::File, io::{BufWriter, Write}, path::Path};

use anyhow::{bail, Context, Result};
use serde_json::Value;

pub use document::{
    build_sets, parse_outlook, read_document, read_outlook, AreaRecord, AreaRejected, GeometryRecord,
    LoadReport, OutlookDocument, Rejection,
};
pub use geojson::{polygon_to_geojson, snapshot_to_geojson, snapshot_to_geojson_with_hazards};

/// Write `value` as pretty JSON.  Refuses to replace an existing file unless
/// `force` is set; `-` is not a valid path.
pub fn write_json(path: &Path, value: &Value, force: bool) -> Result<()> {
    if path == Path::new("-") { bail!("stdout is not supported."); }
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, value).with_context(|| format!("write {}", path.display()))?;
    writer.flush()?;
    Ok(())
}
