// src/exec/toolchain.rs

use std::sync::Arc;

use crate::config::TransformsSection;
use crate::exec::command::ExternalTransform;
use crate::pipeline::transform::{Identity, Transform};

pub const BROWSERSLIST_ENV: &str = "BROWSERSLIST";

/// The external content steps, resolved from `[transforms]`.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub less: Arc<dyn Transform>,
    pub autoprefixer: Arc<dyn Transform>,
    pub cssnano: Arc<dyn Transform>,
    pub babel: Arc<dyn Transform>,
    pub uglify: Arc<dyn Transform>,
    pub imagemin: Arc<dyn Transform>,
}

fn step(name: &str, title: &str, cmd: &str) -> ExternalTransform {
    ExternalTransform::new(name, title, cmd)
}

fn finish(transform: ExternalTransform) -> Arc<dyn Transform> {
    if transform.cmd().trim().is_empty() {
        Arc::new(Identity::new(transform.name().to_string()))
    } else {
        Arc::new(transform)
    }
}

impl Toolchain {
    pub fn from_config(cfg: &TransformsSection) -> Self {
        let mut autoprefixer = step(
            "autoprefixer",
            "Error in .css prefixing",
            &cfg.autoprefixer,
        );
        if !cfg.browsers.is_empty() {
            autoprefixer = autoprefixer.with_env(BROWSERSLIST_ENV, cfg.browsers.join(", "));
        }

        Self {
            less: finish(step("less", "Error in .less file", &cfg.less)),
            autoprefixer: finish(autoprefixer),
            cssnano: finish(step("cssnano", "Error in .css minification", &cfg.cssnano)),
            babel: finish(step("babel", "Error in .js transpilation", &cfg.babel)),
            uglify: finish(step("uglify", "Error in .js minification", &cfg.uglify)),
            imagemin: finish(step("imagemin", "Error in image compression", &cfg.imagemin)),
        }
    }

    /// Every step a pass-through.
    pub fn identity() -> Self {
        Self::from_config(&TransformsSection::identity())
    }
}
