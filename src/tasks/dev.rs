// src/tasks/dev.rs

//! Development tasks: build the bundles inside `app/`.

use std::sync::Arc;

use crate::config::ConfigFile;
use crate::dag::{Step, TaskGraph};
use crate::errors::Result;
use crate::exec::Toolchain;
use crate::pipeline::matcher::Matcher;
use crate::pipeline::order::Orderer;
use crate::pipeline::transform::SetExtension;
use crate::tasks::layout;
use crate::tasks::pipeline::{BundleTask, CleanTask, PipelineTask};
use crate::tasks::serve::ServeTask;
use crate::tasks::watch::{watch_bindings, WatchTask};

pub const LESS: &str = "dev:less";
pub const STYLES: &str = "dev:styles";
pub const SCRIPTS: &str = "dev:scripts";
pub const CLEAN: &str = "dev:clean";
pub const BUILD: &str = "dev:build";
pub const WATCH: &str = "dev:watch";
pub const SERVE: &str = "dev:serve";
pub const DEV: &str = "dev";

pub fn register(graph: &mut TaskGraph, cfg: &ConfigFile, tools: &Toolchain) -> Result<()> {
    let less = PipelineTask::new(
        Matcher::new(layout::LESS_SOURCES, layout::LESS_EXCLUDES)?,
        layout::CSS_DIR,
    )
    .incremental()
    .step(Arc::clone(&tools.less))
    .step(Arc::new(SetExtension::new("css")))
    .step(Arc::clone(&tools.autoprefixer));
    graph.register_atomic(
        LESS,
        "compile .less sources to prefixed .css, changed files only",
        Arc::new(less),
    )?;

    let styles = BundleTask::new(
        Matcher::include(layout::STYLE_SOURCES)?,
        layout::STYLES_BUCKET,
        Orderer::new(layout::STYLE_ORDER)?,
        layout::STYLE_BUNDLE,
    )
    .rewrite(layout::STYLE_URL_REWRITE.0, layout::STYLE_URL_REWRITE.1);
    graph.register_atomic(STYLES, "concatenate stylesheets into main.css", Arc::new(styles))?;

    let scripts = BundleTask::new(
        Matcher::include(layout::SCRIPT_SOURCES)?,
        layout::SCRIPTS_BUCKET,
        Orderer::new(layout::SCRIPT_ORDER)?,
        layout::SCRIPT_BUNDLE,
    );
    graph.register_atomic(SCRIPTS, "concatenate scripts into main.js", Arc::new(scripts))?;

    graph.register_atomic(
        CLEAN,
        "delete generated .css, .js and .map files",
        Arc::new(CleanTask::Files(Matcher::include(layout::DEV_GENERATED)?)),
    )?;

    graph.register_composite(
        BUILD,
        "build main.css and main.js",
        Step::series([
            Step::task(CLEAN),
            Step::task(LESS),
            Step::parallel([STYLES, SCRIPTS]),
        ]),
    )?;

    graph.register_atomic(
        WATCH,
        "rebuild bundles when sources change",
        Arc::new(WatchTask::new(watch_bindings()?, &cfg.config, &cfg.watch)),
    )?;

    graph.register_atomic(
        SERVE,
        "serve app/ with live reload",
        Arc::new(ServeTask::new(cfg.server.clone())),
    )?;

    graph.register_composite(
        DEV,
        "build, then watch and serve",
        Step::series([Step::task(BUILD), Step::parallel([WATCH, SERVE])]),
    )?;

    Ok(())
}
