// src/pipeline/transform.rs

//! Per-record transformation steps.
//!
//! Content transformations that live outside this crate (less compiler,
//! prefixer, minifiers, image compressor) are [`ExternalTransform`]s; the
//! in-process steps here cover the text and path rewrites the pipelines
//! need.
//!
//! [`ExternalTransform`]: crate::exec::ExternalTransform

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::errors::{AssetflowError, Result};
use crate::pipeline::record::FileRecord;

pub type TransformFuture<'a> = Pin<Box<dyn Future<Output = Result<FileRecord>> + Send + 'a>>;

/// A step mapping one record to one record.
pub trait Transform: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn apply<'a>(&'a self, record: FileRecord, cancel: &'a CancellationToken)
    -> TransformFuture<'a>;
}

/// Run `steps` over `records`, one step at a time, in order.
///
/// The first failing record aborts the whole run. Cancellation is checked
/// before every record.
pub async fn apply_steps(
    task: &str,
    steps: &[Arc<dyn Transform>],
    mut records: Vec<FileRecord>,
    cancel: &CancellationToken,
) -> Result<Vec<FileRecord>> {
    for step in steps {
        let mut out = Vec::with_capacity(records.len());
        for record in records {
            if cancel.is_cancelled() {
                return Err(AssetflowError::Cancelled(task.to_string()));
            }
            let record = step.apply(record, cancel).await?;
            debug!(task, step = step.name(), file = %record.path, "applied step");
            out.push(record);
        }
        records = out;
    }
    Ok(records)
}

fn ready(record: FileRecord) -> TransformFuture<'static> {
    Box::pin(async move { Ok(record) })
}

/// Pass-through step, used where a configured command is empty.
#[derive(Debug, Clone)]
pub struct Identity {
    name: String,
}

impl Identity {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Transform for Identity {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply<'a>(&'a self, record: FileRecord, _cancel: &'a CancellationToken) -> TransformFuture<'a> {
        ready(record)
    }
}

/// Literal substring replacement, every occurrence.
#[derive(Debug, Clone)]
pub struct Replace {
    from: String,
    to: String,
}

impl Replace {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Transform for Replace {
    fn name(&self) -> &str {
        "replace"
    }

    fn apply<'a>(&'a self, mut record: FileRecord, _cancel: &'a CancellationToken) -> TransformFuture<'a> {
        record.contents = replace_bytes(&record.contents, self.from.as_bytes(), self.to.as_bytes());
        ready(record)
    }
}

/// Replace every non-overlapping occurrence of `from`, scanning left to right.
pub fn replace_bytes(haystack: &[u8], from: &[u8], to: &[u8]) -> Vec<u8> {
    if from.is_empty() {
        return haystack.to_vec();
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(from) {
            out.extend_from_slice(to);
            i += from.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }
    out
}

/// Insert a suffix before the extension: `main.css` -> `main.min.css`.
#[derive(Debug, Clone)]
pub struct RenameSuffix {
    suffix: String,
}

impl RenameSuffix {
    pub fn new(suffix: impl Into<String>) -> Self {
        Self {
            suffix: suffix.into(),
        }
    }
}

impl Transform for RenameSuffix {
    fn name(&self) -> &str {
        "rename"
    }

    fn apply<'a>(&'a self, mut record: FileRecord, _cancel: &'a CancellationToken) -> TransformFuture<'a> {
        let name = record.file_name().to_string();
        let renamed = match record.extension() {
            Some(ext) => {
                let stem = &name[..name.len() - ext.len() - 1];
                format!("{stem}{}.{ext}", self.suffix)
            }
            None => format!("{name}{}", self.suffix),
        };
        record.set_file_name(&renamed);
        ready(record)
    }
}

/// Replace the extension: `base.less` -> `base.css`.
#[derive(Debug, Clone)]
pub struct SetExtension {
    extension: String,
}

impl SetExtension {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Transform for SetExtension {
    fn name(&self) -> &str {
        "extension"
    }

    fn apply<'a>(&'a self, mut record: FileRecord, _cancel: &'a CancellationToken) -> TransformFuture<'a> {
        let name = record.file_name().to_string();
        let stem = match record.extension() {
            Some(ext) => name[..name.len() - ext.len() - 1].to_string(),
            None => name,
        };
        record.set_file_name(&format!("{stem}.{}", self.extension));
        ready(record)
    }
}
