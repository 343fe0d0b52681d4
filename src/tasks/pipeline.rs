// src/tasks/pipeline.rs

//! The three shapes of atomic build task: per-file pipelines, bundles and
//! deletions.

use std::sync::Arc;

use tracing::{debug, info};

use crate::engine::action::{TaskAction, TaskContext, TaskFuture};
use crate::errors::{AssetflowError, Result};
use crate::pipeline::concat::concat;
use crate::pipeline::dest::{delete_dir, delete_matching, write_records};
use crate::pipeline::matcher::Matcher;
use crate::pipeline::order::Orderer;
use crate::pipeline::record::FileRecord;
use crate::pipeline::transform::{apply_steps, Replace, Transform};

fn log_records(task: &str, step: &str, records: &[FileRecord]) {
    for record in records {
        debug!(task, step, file = %record.path, "record");
    }
}

/// Match files, run them through `steps` one by one, write them below
/// `dest`.
#[derive(Debug)]
pub struct PipelineTask {
    matcher: Matcher,
    /// Only pick up files modified since the last successful run.
    incremental: bool,
    steps: Vec<Arc<dyn Transform>>,
    dest: String,
}

impl PipelineTask {
    pub fn new(matcher: Matcher, dest: impl Into<String>) -> Self {
        Self {
            matcher,
            incremental: false,
            steps: Vec::new(),
            dest: dest.into(),
        }
    }

    pub fn incremental(mut self) -> Self {
        self.incremental = true;
        self
    }

    pub fn step(mut self, step: Arc<dyn Transform>) -> Self {
        self.steps.push(step);
        self
    }

    async fn execute(&self, ctx: TaskContext<'_>) -> Result<()> {
        let build = ctx.build;
        let since = if self.incremental { ctx.since } else { None };

        let records = self.matcher.collect(build.fs(), build.root(), since)?;
        log_records(ctx.task, "src", &records);
        if records.is_empty() {
            info!(task = ctx.task, "no matching files changed");
            return Ok(());
        }

        let records = apply_steps(ctx.task, &self.steps, records, ctx.cancel).await?;
        let written = write_records(build.fs(), build.root(), &self.dest, records, ctx.task, ctx.cancel)?;
        info!(task = ctx.task, files = written.len(), dest = %self.dest, "wrote files");
        Ok(())
    }
}

impl TaskAction for PipelineTask {
    fn run<'a>(&'a self, ctx: TaskContext<'a>) -> TaskFuture<'a> {
        Box::pin(self.execute(ctx))
    }
}

/// Match fragments, merge them with everything seen before under `bucket`,
/// order them, and concatenate them into one file with a source map.
///
/// Always incremental: only changed fragments are read, the bucket supplies
/// the rest.
#[derive(Debug)]
pub struct BundleTask {
    matcher: Matcher,
    bucket: String,
    orderer: Orderer,
    /// Root-relative path of the bundle.
    bundle: String,
    rewrite: Option<Replace>,
}

impl BundleTask {
    pub fn new(
        matcher: Matcher,
        bucket: impl Into<String>,
        orderer: Orderer,
        bundle: impl Into<String>,
    ) -> Self {
        Self {
            matcher,
            bucket: bucket.into(),
            orderer,
            bundle: bundle.into(),
            rewrite: None,
        }
    }

    pub fn rewrite(mut self, from: &str, to: &str) -> Self {
        self.rewrite = Some(Replace::new(from, to));
        self
    }

    async fn execute(&self, ctx: TaskContext<'_>) -> Result<()> {
        let build = ctx.build;

        let changed = self.matcher.collect(build.fs(), build.root(), ctx.since)?;
        log_records(ctx.task, "src", &changed);

        let remembered = build.buckets().remember(&self.bucket, changed);
        log_records(ctx.task, "remember", &remembered);

        let ordered = self.orderer.order(remembered);
        let Some(mut bundle) = concat(&ordered, &self.bundle, true) else {
            info!(task = ctx.task, bundle = %self.bundle, "nothing to bundle");
            return Ok(());
        };
        debug!(task = ctx.task, step = "concat", file = %bundle.path, "record");

        if let Some(rewrite) = &self.rewrite {
            bundle = rewrite.apply(bundle, ctx.cancel).await?;
            debug!(task = ctx.task, step = "replace", file = %bundle.path, "record");
        }

        let dest = bundle.base.clone();
        let written = write_records(build.fs(), build.root(), &dest, vec![bundle], ctx.task, ctx.cancel)?;
        info!(task = ctx.task, fragments = ordered.len(), files = ?written, "wrote bundle");
        Ok(())
    }
}

impl TaskAction for BundleTask {
    fn run<'a>(&'a self, ctx: TaskContext<'a>) -> TaskFuture<'a> {
        Box::pin(self.execute(ctx))
    }
}

#[derive(Debug)]
pub enum CleanTask {
    /// Delete every file a matcher selects.
    Files(Matcher),
    /// Delete a whole directory below the root.
    Dir(String),
}

impl CleanTask {
    async fn execute(&self, ctx: TaskContext<'_>) -> Result<()> {
        if ctx.cancel.is_cancelled() {
            return Err(AssetflowError::Cancelled(ctx.task.to_string()));
        }
        let build = ctx.build;
        match self {
            CleanTask::Files(matcher) => {
                delete_matching(build.fs(), build.root(), matcher, ctx.task)?;
            }
            CleanTask::Dir(dir) => {
                delete_dir(build.fs(), build.root(), dir, ctx.task)?;
            }
        }
        Ok(())
    }
}

impl TaskAction for CleanTask {
    fn run<'a>(&'a self, ctx: TaskContext<'a>) -> TaskFuture<'a> {
        Box::pin(self.execute(ctx))
    }
}
