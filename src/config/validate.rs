// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{AssetflowError, Result};

const MAX_DEBOUNCE_MS: u64 = 10_000;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = AssetflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

pub fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_server(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    // Enum-valued settings are checked during deserialization.
    if cfg.config.queue_length == 0 {
        return Err(AssetflowError::ConfigError(
            "[config].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.host.trim().is_empty() {
        return Err(AssetflowError::ConfigError(
            "[server].host must not be empty".to_string(),
        ));
    }
    if cfg.server.debounce_ms > MAX_DEBOUNCE_MS {
        return Err(AssetflowError::ConfigError(format!(
            "[server].debounce_ms must be <= {MAX_DEBOUNCE_MS} (got {})",
            cfg.server.debounce_ms
        )));
    }
    Ok(())
}
