// src/tasks/layout.rs

//! Where sources live and where generated files go, relative to the project
//! root.

/// Served by the dev server.
pub const APP_DIR: &str = "app";
pub const DIST_DIR: &str = "dist";

pub const LESS_SOURCES: &[&str] = &["app/styles/less/*.less"];
/// Imported by the other stylesheets, never compiled on its own.
pub const LESS_EXCLUDES: &[&str] = &["app/styles/less/variables.less"];
pub const CSS_DIR: &str = "app/styles/css";

pub const STYLE_SOURCES: &[&str] = &["app/styles/{css,libs}/*.css"];
pub const STYLE_ORDER: &[&str] = &[
    "app/styles/libs/*.css",
    "app/styles/css/reset.css",
    "app/styles/css/fonts.css",
    "app/styles/css/base.css",
    "app/styles/css/common.css",
    "app/styles/css/media.css",
];
pub const STYLES_DIR: &str = "app/styles";
pub const STYLE_BUNDLE: &str = "app/styles/main.css";
pub const STYLES_BUCKET: &str = "styles";
/// Library stylesheets refer to assets two levels up; the bundle sits one
/// level higher than they do.
pub const STYLE_URL_REWRITE: (&str, &str) = ("../../", "../");

pub const SCRIPT_SOURCES: &[&str] = &["app/scripts/{js,libs}/*.js"];
pub const SCRIPT_ORDER: &[&str] = &["app/scripts/libs/*.js", "app/scripts/js/*.js"];
pub const SCRIPTS_DIR: &str = "app/scripts";
pub const SCRIPT_BUNDLE: &str = "app/scripts/main.js";
pub const SCRIPTS_BUCKET: &str = "scripts";

/// Everything the development build generates.
pub const DEV_GENERATED: &[&str] = &[
    "app/styles/css/*.css",
    "app/styles/*.{css,map}",
    "app/scripts/*.{js,map}",
];

pub const FONT_SOURCES: &[&str] = &["app/fonts/**/*.*"];
pub const IMAGE_SOURCES: &[&str] = &["app/images/**/*.*"];
pub const HTML_SOURCES: &[&str] = &["app/index.html"];

pub const DIST_FONTS_DIR: &str = "dist/fonts";
pub const DIST_IMAGES_DIR: &str = "dist/images";
pub const DIST_STYLES_DIR: &str = "dist/styles";
pub const DIST_SCRIPTS_DIR: &str = "dist/scripts";

pub const MINIFIED_SUFFIX: &str = ".min";

/// Source directories the watcher rebuilds from.
pub const LESS_WATCH: &str = "app/styles/less/**";
pub const SCRIPTS_WATCH: &str = "app/scripts/js/**";
