// src/watch/mod.rs

//! File watching and change detection.
//!
//! - [`watcher`] wraps `notify` and forwards changed paths.
//! - [`patterns`] holds the watch bindings (path set -> step).
//! - [`event_handler`] maps a changed path to the bindings it triggers,
//!   optionally skipping bindings whose file contents did not change
//!   ([`hash`]).
//!
//! Nothing here runs tasks; triggers go to the engine's watch runtime.

pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use event_handler::ChangeDispatcher;
pub use hash::{compute_file_hash, compute_hash_for_paths, ContentHashes};
pub use patterns::WatchBinding;
pub use watcher::{spawn_watcher, WatcherHandle};
