// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: the TOML-backed data model, raw and validated.
//! - `loader.rs`: reading a file from disk (or falling back to defaults).
//! - `validate.rs`: `TryFrom<RawConfigFile> for ConfigFile`.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, ConfigSection, RawConfigFile, ServerSection, TransformsSection, WatchSection,
};
