pub mod classify;
pub mod convert;
pub mod validate;

use std::path::Path;

use anyhow::Result;

use crate::config::EngineConfig;

/// Engine config from `--config`, or the defaults.
pub(crate) fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_json_file(path),
        None => Ok(EngineConfig::default()),
    }
}
