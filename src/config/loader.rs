// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Parse a configuration file without semantic validation.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading config file {}", path.display()))?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Parse and validate a configuration file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    ConfigFile::try_from(raw_config)
}

/// Load the config the CLI asked for.
///
/// A missing file at the default location means built-in defaults; a
/// missing file that was named explicitly is an error.
pub fn load_or_default(path: impl AsRef<Path>, explicit: bool) -> Result<ConfigFile> {
    let path = path.as_ref();
    if !explicit && !path.exists() {
        debug!(path = %path.display(), "no config file; using defaults");
        return ConfigFile::try_from(RawConfigFile::default());
    }
    load_and_validate(path)
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("Assetflow.toml")
}
