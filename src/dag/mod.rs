// src/dag/mod.rs

//! Task registry.
//!
//! [`graph`] holds named task descriptors, the `series`/`parallel` step tree
//! composites are built from, and validation (resolvable names, no cycles).
//! Invocation lives in [`crate::engine::runner`].

pub mod graph;

pub use graph::{Step, TaskDescriptor, TaskGraph, TaskKind};
