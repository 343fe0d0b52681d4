// src/exec/mod.rs

//! Process execution layer.
//!
//! - [`command`] runs external content transforms (`tokio::process`), with
//!   contents piped through stdin/stdout.
//! - [`toolchain`] builds the configured set of transforms.
//! - [`backend`] provides the `RunBackend` trait the watch runtime launches
//!   runs through, and the production `RunnerBackend`.

pub mod backend;
pub mod command;
pub mod toolchain;

pub use backend::{RunBackend, RunFuture, RunnerBackend};
pub use command::{run_transform, ExternalTransform};
pub use toolchain::Toolchain;
