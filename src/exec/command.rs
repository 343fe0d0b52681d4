// src/exec/command.rs

//! External content transforms: a shell command reading a file's contents on
//! stdin and writing the transformed contents to stdout.

use std::process::Stdio;

use anyhow::Context;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::errors::{AssetflowError, Result};
use crate::pipeline::record::FileRecord;
use crate::pipeline::transform::{Transform, TransformFuture};

/// Environment variable holding the root-relative path of the record being
/// transformed.
pub const FILE_ENV: &str = "ASSETFLOW_FILE";

/// A step implemented by an external process.
#[derive(Debug, Clone)]
pub struct ExternalTransform {
    name: String,
    /// Human title used when the step fails, e.g. "Error in .less file".
    title: String,
    cmd: String,
    env: Vec<(String, String)>,
}

impl ExternalTransform {
    pub fn new(name: impl Into<String>, title: impl Into<String>, cmd: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            cmd: cmd.into(),
            env: Vec::new(),
        }
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn cmd(&self) -> &str {
        &self.cmd
    }
}

impl Transform for ExternalTransform {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply<'a>(&'a self, mut record: FileRecord, cancel: &'a CancellationToken) -> TransformFuture<'a> {
        Box::pin(async move {
            let output = run_transform(self, &record, cancel).await?;
            record.contents = output;
            Ok(record)
        })
    }
}

fn shell_command(cmd: &str) -> Command {
    if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(cmd);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(cmd);
        c
    }
}

/// Run `transform` over one record and return its stdout.
///
/// A non-zero exit becomes [`AssetflowError::TransformFailed`] carrying the
/// process's stderr. If `cancel` fires first the child is killed and
/// [`AssetflowError::Cancelled`] is returned.
pub async fn run_transform(
    transform: &ExternalTransform,
    record: &FileRecord,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    debug!(step = %transform.name, file = %record.path, cmd = %transform.cmd, "starting transform process");

    let mut cmd = shell_command(&transform.cmd);
    cmd.env(FILE_ENV, &record.path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);
    for (key, value) in &transform.env {
        cmd.env(key, value);
    }

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning '{}' for {}", transform.cmd, record.path))?;

    // Feed stdin from a separate task so a process that writes before it has
    // read everything cannot deadlock against us.
    if let Some(mut stdin) = child.stdin.take() {
        let input = record.contents.clone();
        let file = record.path.clone();
        tokio::spawn(async move {
            if let Err(err) = stdin.write_all(&input).await {
                debug!(file = %file, error = %err, "transform closed stdin early");
            }
        });
    }

    let output = tokio::select! {
        out = child.wait_with_output() => out
            .with_context(|| format!("waiting for '{}' on {}", transform.cmd, record.path))?,
        _ = cancel.cancelled() => {
            // Dropping the wait future drops the child, which kills it.
            warn!(step = %transform.name, file = %record.path, "transform cancelled");
            return Err(AssetflowError::Cancelled(transform.name.clone()));
        }
    };

    if output.status.success() {
        return Ok(output.stdout);
    }

    let message = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if message.is_empty() {
        format!("exited with {}", output.status)
    } else {
        message
    };
    error!(
        title = %transform.title,
        step = %transform.name,
        file = %record.path,
        message = %message,
        "transform failed"
    );
    Err(AssetflowError::TransformFailed {
        step: transform.name.clone(),
        file: record.path.clone(),
        message,
    })
}
