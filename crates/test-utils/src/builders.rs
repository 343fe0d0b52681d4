#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetflow::config::{ConfigFile, RawConfigFile, TransformsSection};
use assetflow::engine::{BuildContext, Runner, RunnerOptions};
use assetflow::exec::Toolchain;
use assetflow::fs::mock::MockFileSystem;
use assetflow::fs::FileSystem;
use assetflow::tasks::build_graph_with;
use assetflow::types::{ParallelFailureBehaviour, TriggerWhileRunningBehaviour};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts from the built-in defaults, with every external transform
/// disabled so pipelines only run the in-process steps.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        let mut config = RawConfigFile::default();
        config.transforms = TransformsSection::identity();
        Self { config }
    }

    pub fn parallel_failure(mut self, val: ParallelFailureBehaviour) -> Self {
        self.config.config.parallel_failure = val;
        self
    }

    pub fn trigger_behaviour(mut self, val: TriggerWhileRunningBehaviour) -> Self {
        self.config.config.triggered_while_running_behaviour = val;
        self
    }

    pub fn queue_length(mut self, val: usize) -> Self {
        self.config.config.queue_length = val;
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn port(mut self, val: u16) -> Self {
        self.config.server.port = val;
        self
    }

    pub fn debounce_ms(mut self, val: u64) -> Self {
        self.config.server.debounce_ms = val;
        self
    }

    pub fn transforms(mut self, val: TransformsSection) -> Self {
        self.config.transforms = val;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// An in-memory project tree rooted at `.`.
pub struct ProjectFixture {
    pub fs: MockFileSystem,
    pub root: PathBuf,
}

pub const INDEX_HTML: &str = "<html>\n<head>\n<link rel=\"stylesheet\" href=\"styles/main.css\">\n</head>\n<body>\n<script src=\"scripts/main.js\"></script>\n</body>\n</html>\n";

impl ProjectFixture {
    pub fn empty() -> Self {
        Self {
            fs: MockFileSystem::new(),
            root: PathBuf::from("."),
        }
    }

    /// The layout the build expects, with a few sources of each kind.
    pub fn standard() -> Self {
        let project = Self::empty();
        project.write("app/styles/less/variables.less", "@accent: #c00;");
        project.write("app/styles/less/base.less", "body { color: black; }");
        project.write("app/styles/less/reset.less", "* { margin: 0; }");
        project.write(
            "app/styles/libs/normalize.css",
            "html { background: url(\"../../images/bg.png\"); }",
        );
        project.write("app/scripts/libs/jquery.js", "var jQuery = {};");
        project.write("app/scripts/js/app.js", "console.log(\"app\");");
        project.write("app/scripts/js/menu.js", "console.log(\"menu\");");
        project.write("app/fonts/roboto/Roboto.woff", "woff");
        project.write("app/images/logo.png", "png");
        project.write("app/images/icons/menu.svg", "<svg/>");
        project.write("app/index.html", INDEX_HTML);
        project
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn write(&self, rel: &str, contents: &str) {
        self.fs.add_file(self.path(rel), contents);
    }

    pub fn read(&self, rel: &str) -> String {
        self.fs
            .read_to_string(&self.path(rel))
            .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
    }

    pub fn remove(&self, rel: &str) {
        self.fs
            .remove_file(&self.path(rel))
            .unwrap_or_else(|e| panic!("removing {rel}: {e}"));
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.fs.exists(&self.path(rel))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn build_context(&self) -> Arc<BuildContext> {
        Arc::new(BuildContext::new(self.root.clone(), Arc::new(self.fs.clone())))
    }

    /// A runner over the full task table with pass-through content steps.
    pub fn runner(&self, cfg: &ConfigFile) -> Runner {
        self.runner_with(cfg, &Toolchain::identity())
    }

    /// A runner whose content steps come from `tools`.
    pub fn runner_with(&self, cfg: &ConfigFile, tools: &Toolchain) -> Runner {
        let graph = build_graph_with(cfg, tools).expect("building task graph");
        let options = RunnerOptions {
            parallel_failure: cfg.config.parallel_failure,
        };
        Runner::new(graph, self.build_context(), options).expect("valid task graph")
    }
}
