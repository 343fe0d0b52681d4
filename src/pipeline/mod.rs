// src/pipeline/mod.rs

//! File-record pipelines.
//!
//! - [`matcher`] turns globs (and an optional "since") into records.
//! - [`remember`] aggregates records across incremental runs.
//! - [`order`] re-sequences records by pattern priority.
//! - [`concat`] and [`sourcemap`] merge fragments into a bundle.
//! - [`transform`] holds the per-record step abstraction.
//! - [`dest`] writes and deletes.

pub mod concat;
pub mod dest;
pub mod matcher;
pub mod order;
pub mod record;
pub mod remember;
pub mod sourcemap;
pub mod transform;

pub use concat::concat;
pub use matcher::Matcher;
pub use order::Orderer;
pub use record::FileRecord;
pub use remember::BucketCache;
pub use sourcemap::SourceMap;
pub use transform::{apply_steps, Transform};
