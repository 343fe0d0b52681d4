// src/watch/patterns.rs

use std::fmt;

use crate::dag::Step;
use crate::engine::TaskName;
use crate::errors::Result;
use crate::pipeline::matcher::Matcher;

/// A watched path set and the step it triggers.
///
/// Patterns are relative to the project root; the watcher passes root-
/// relative paths such as `app/styles/less/base.less` into
/// [`matches`](Self::matches).
#[derive(Clone)]
pub struct WatchBinding {
    name: TaskName,
    patterns: Vec<String>,
    matcher: Matcher,
    step: Step,
}

impl fmt::Debug for WatchBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchBinding")
            .field("name", &self.name)
            .field("patterns", &self.patterns)
            .field("step", &self.step.to_string())
            .finish()
    }
}

impl WatchBinding {
    pub fn new<S: AsRef<str>>(name: impl Into<TaskName>, patterns: &[S], step: Step) -> Result<Self> {
        Ok(Self {
            name: name.into(),
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            matcher: Matcher::include(patterns)?,
            step,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
    }
}
