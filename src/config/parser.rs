//! Configuration file parsing (HOCON format).

use std::path::Path;

use hocon::HoconLoader;
use tracing::info;

use crate::common::error::ConfigError;
use crate::config::types::Config;

/// Load configuration from a HOCON file.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    load_config_str(&content)
}

/// Load configuration, tolerating a missing file when the path was not asked for.
///
/// Running without any config file is fine as long as the command line
/// supplies what validation needs.
pub fn load_config_or_default(
    path: impl AsRef<Path>,
    explicit: bool,
) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    if !explicit && !path.exists() {
        info!(
            "No config file at {}, starting from defaults",
            path.display()
        );
        return Ok(Config::default());
    }
    load_config(path)
}

/// Load configuration from a HOCON string.
pub fn load_config_str(content: &str) -> Result<Config, ConfigError> {
    HoconLoader::new()
        .load_str(content)
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?
        .resolve()
        .map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })
}
