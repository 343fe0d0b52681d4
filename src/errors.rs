// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssetflowError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Source is missing or unreadable: {}", .0.display())]
    MissingRoot(PathBuf),

    /// A content transformation rejected its input.
    #[error("{step} failed on {file}: {message}")]
    TransformFailed {
        step: String,
        file: String,
        message: String,
    },

    /// The invocation wound down because its cancellation token fired.
    #[error("Task '{0}' was cancelled")]
    Cancelled(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AssetflowError {
    /// True if this error only reports cooperative cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AssetflowError::Cancelled(_))
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, AssetflowError>;
