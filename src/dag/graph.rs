// src/dag/graph.rs

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::engine::action::TaskAction;
use crate::engine::TaskName;
use crate::errors::{AssetflowError, Result};

/// A node of a composite task's body.
///
/// Anonymous groups nest freely, so `series(a, parallel(b, c))` is
/// `Series([Task(a), Parallel([Task(b), Task(c)])])`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Task(TaskName),
    Series(Vec<Step>),
    Parallel(Vec<Step>),
}

impl Step {
    pub fn task(name: impl Into<TaskName>) -> Self {
        Step::Task(name.into())
    }

    pub fn series<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        Step::Series(steps.into_iter().map(Into::into).collect())
    }

    pub fn parallel<I, S>(steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Step>,
    {
        Step::Parallel(steps.into_iter().map(Into::into).collect())
    }

    /// Every task name referenced anywhere in this step, in first-seen order.
    pub fn task_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_names(&mut out);
        out
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Step::Task(name) => {
                if !out.contains(&name.as_str()) {
                    out.push(name.as_str());
                }
            }
            Step::Series(steps) | Step::Parallel(steps) => {
                for step in steps {
                    step.collect_names(out);
                }
            }
        }
    }
}

impl From<&str> for Step {
    fn from(name: &str) -> Self {
        Step::Task(name.to_string())
    }
}

impl From<String> for Step {
    fn from(name: String) -> Self {
        Step::Task(name)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, steps) = match self {
            Step::Task(name) => return f.write_str(name),
            Step::Series(steps) => ("series", steps),
            Step::Parallel(steps) => ("parallel", steps),
        };
        write!(f, "{label}(")?;
        for (idx, step) in steps.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{step}")?;
        }
        f.write_str(")")
    }
}

#[derive(Clone)]
pub enum TaskKind {
    /// Runs a pipeline (or a long-lived service) directly.
    Atomic(Arc<dyn TaskAction>),
    /// Runs other tasks.
    Composite(Step),
}

impl fmt::Debug for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskKind::Atomic(_) => f.write_str("Atomic(..)"),
            TaskKind::Composite(step) => write!(f, "Composite({step})"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaskDescriptor {
    pub name: TaskName,
    pub description: String,
    pub kind: TaskKind,
}

/// All registered tasks, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: BTreeMap<TaskName, TaskDescriptor>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_atomic(
        &mut self,
        name: impl Into<TaskName>,
        description: impl Into<String>,
        action: Arc<dyn TaskAction>,
    ) -> Result<()> {
        self.insert(TaskDescriptor {
            name: name.into(),
            description: description.into(),
            kind: TaskKind::Atomic(action),
        })
    }

    pub fn register_composite(
        &mut self,
        name: impl Into<TaskName>,
        description: impl Into<String>,
        step: Step,
    ) -> Result<()> {
        self.insert(TaskDescriptor {
            name: name.into(),
            description: description.into(),
            kind: TaskKind::Composite(step),
        })
    }

    fn insert(&mut self, descriptor: TaskDescriptor) -> Result<()> {
        if self.tasks.contains_key(&descriptor.name) {
            return Err(AssetflowError::ConfigError(format!(
                "task '{}' is registered twice",
                descriptor.name
            )));
        }
        self.tasks.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TaskDescriptor> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered tasks in name order.
    pub fn tasks(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.tasks.values()
    }

    /// Tasks a composite refers to directly; empty for atomic tasks.
    pub fn dependencies_of(&self, name: &str) -> Vec<&str> {
        match self.tasks.get(name).map(|t| &t.kind) {
            Some(TaskKind::Composite(step)) => step.task_names(),
            _ => Vec::new(),
        }
    }

    /// Check that every referenced task exists and that no composite reaches
    /// itself.
    pub fn validate(&self) -> Result<()> {
        for task in self.tasks.values() {
            for dep in self.dependencies_of(&task.name) {
                if !self.tasks.contains_key(dep) {
                    return Err(AssetflowError::TaskNotFound(format!(
                        "'{dep}' (referenced by '{}')",
                        task.name
                    )));
                }
            }
        }

        // Edge direction: composite -> child.
        let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();
        for name in self.tasks.keys() {
            graph.add_node(name.as_str());
        }
        for name in self.tasks.keys() {
            for dep in self.dependencies_of(name) {
                if dep == name {
                    return Err(AssetflowError::DagCycle(format!(
                        "task '{name}' refers to itself"
                    )));
                }
                graph.add_edge(name.as_str(), dep, ());
            }
        }

        match toposort(&graph, None) {
            Ok(_order) => Ok(()),
            Err(cycle) => Err(AssetflowError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                cycle.node_id()
            ))),
        }
    }

    /// Check an ad-hoc step (e.g. a watch binding) against this graph.
    pub fn validate_step(&self, step: &Step) -> Result<()> {
        for name in step.task_names() {
            if !self.tasks.contains_key(name) {
                return Err(AssetflowError::TaskNotFound(format!("'{name}' (in {step})")));
            }
        }
        Ok(())
    }
}
