//! Reading a single config layer.

use super::{ConfigLayerSource, schema};
use crate::ConfigError;
use log::debug;
use serde_json::Value;
use std::path::Path;

/// Read one layer and check it against the schema.
///
/// A missing file yields `None` unless the layer is `required`.
pub(super) fn read_layer(
    source: ConfigLayerSource,
    path: &Path,
    required: bool,
) -> Result<Option<Value>, ConfigError> {
    if !required && !path.exists() {
        debug!(
            "config layer absent (source={}, path={})",
            source,
            path.display()
        );
        return Ok(None);
    }
    let label = source.label(path);
    let value = parse_json5(&read_file(path)?, &label)?;
    schema::validate_layer_schema(&value, &label)?;
    debug!("config layer read ({label})");
    Ok(Some(value))
}

pub(super) fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse JSON5 text, naming `origin` in syntax errors.
pub(super) fn parse_json5(contents: &str, origin: &str) -> Result<Value, ConfigError> {
    json5::from_str(contents).map_err(|source| ConfigError::Syntax {
        origin: origin.to_string(),
        source,
    })
}
