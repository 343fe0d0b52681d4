// src/tasks/dist.rs

//! Distribution tasks: minified copies under `dist/`.

use std::sync::Arc;

use crate::dag::{Step, TaskGraph};
use crate::errors::Result;
use crate::exec::Toolchain;
use crate::pipeline::matcher::Matcher;
use crate::pipeline::transform::{RenameSuffix, Replace};
use crate::tasks::dev;
use crate::tasks::layout;
use crate::tasks::pipeline::{CleanTask, PipelineTask};

pub const FONTS: &str = "dist:fonts";
pub const IMAGES: &str = "dist:images";
pub const STYLES: &str = "dist:styles";
pub const SCRIPTS: &str = "dist:scripts";
pub const HTML: &str = "dist:html";
pub const CLEAN: &str = "dist:clean";
pub const DIST: &str = "dist";

pub fn register(graph: &mut TaskGraph, tools: &Toolchain) -> Result<()> {
    let fonts = PipelineTask::new(Matcher::include(layout::FONT_SOURCES)?, layout::DIST_FONTS_DIR);
    graph.register_atomic(FONTS, "copy fonts", Arc::new(fonts))?;

    let images = PipelineTask::new(Matcher::include(layout::IMAGE_SOURCES)?, layout::DIST_IMAGES_DIR)
        .step(Arc::clone(&tools.imagemin));
    graph.register_atomic(IMAGES, "compress and copy images", Arc::new(images))?;

    let styles = PipelineTask::new(Matcher::include(&[layout::STYLE_BUNDLE])?, layout::DIST_STYLES_DIR)
        .step(Arc::clone(&tools.cssnano))
        .step(Arc::new(RenameSuffix::new(layout::MINIFIED_SUFFIX)));
    graph.register_atomic(STYLES, "minify main.css", Arc::new(styles))?;

    let scripts = PipelineTask::new(Matcher::include(&[layout::SCRIPT_BUNDLE])?, layout::DIST_SCRIPTS_DIR)
        .step(Arc::clone(&tools.babel))
        .step(Arc::clone(&tools.uglify))
        .step(Arc::new(RenameSuffix::new(layout::MINIFIED_SUFFIX)));
    graph.register_atomic(SCRIPTS, "transpile and minify main.js", Arc::new(scripts))?;

    let html = PipelineTask::new(Matcher::include(layout::HTML_SOURCES)?, layout::DIST_DIR)
        .step(Arc::new(Replace::new("main.css", "main.min.css")))
        .step(Arc::new(Replace::new("main.js", "main.min.js")));
    graph.register_atomic(HTML, "copy markup pointing at minified bundles", Arc::new(html))?;

    graph.register_atomic(
        CLEAN,
        "delete the dist directory",
        Arc::new(CleanTask::Dir(layout::DIST_DIR.to_string())),
    )?;

    graph.register_composite(
        DIST,
        "build everything and produce dist/",
        Step::series([
            Step::parallel([CLEAN, dev::BUILD]),
            Step::parallel([FONTS, IMAGES, STYLES, SCRIPTS, HTML]),
        ]),
    )?;

    Ok(())
}
