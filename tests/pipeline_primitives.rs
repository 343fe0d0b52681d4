// tests/pipeline_primitives.rs

mod common;
use crate::common::{init_tracing, record, TestResult};

use std::path::Path;

use assetflow::errors::AssetflowError;
use assetflow::fs::mock::MockFileSystem;
use assetflow::fs::FileSystem;
use assetflow::pipeline::concat::relative_path;
use assetflow::pipeline::dest::{delete_dir, delete_matching, write_records};
use assetflow::pipeline::matcher::glob_base;
use assetflow::pipeline::sourcemap::encode_vlq;
use assetflow::pipeline::transform::{RenameSuffix, Replace, SetExtension};
use assetflow::pipeline::{apply_steps, concat, BucketCache, Matcher, Orderer, SourceMap, Transform};
use assetflow::tasks::layout;
use assetflow::types::UnmatchedPolicy;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

fn tree() -> MockFileSystem {
    let fs = MockFileSystem::new();
    for path in [
        "app/styles/less/base.less",
        "app/styles/less/variables.less",
        "app/styles/less/mixins/grid.less",
        "app/styles/css/base.css",
        "app/styles/libs/normalize.css",
        "app/styles/main.css",
        "app/images/logo.png",
        "app/images/icons/menu.svg",
        "app/images/README",
        "app/images/.gitkeep",
        "app/images/.thumbs/logo.png",
    ] {
        fs.add_file(path, path);
    }
    fs
}

fn paths(matcher: &Matcher, fs: &MockFileSystem) -> Vec<String> {
    let mut out: Vec<String> = matcher
        .paths(fs, Path::new("."))
        .expect("resolving matcher")
        .into_iter()
        .map(|(rel, _)| rel)
        .collect();
    out.sort();
    out
}

#[test]
fn glob_base_stops_at_first_wildcard_component() {
    assert_eq!(glob_base("app/styles/{css,libs}/*.css"), "app/styles");
    assert_eq!(glob_base("app/fonts/**/*.*"), "app/fonts");
    assert_eq!(glob_base("app/index.html"), "app");
    assert_eq!(glob_base("*.html"), "");
}

#[test]
fn single_star_does_not_cross_directories() -> TestResult {
    init_tracing();
    let fs = tree();
    let matcher = Matcher::new(&["app/styles/less/*.less"], &["!app/styles/less/variables.less"])?;

    assert_eq!(paths(&matcher, &fs), vec!["app/styles/less/base.less"]);
    Ok(())
}

#[test]
fn braces_and_double_star_select_across_directories() -> TestResult {
    let fs = tree();

    let styles = Matcher::include(&["app/styles/{css,libs}/*.css"])?;
    assert_eq!(
        paths(&styles, &fs),
        vec!["app/styles/css/base.css", "app/styles/libs/normalize.css"]
    );

    // `*.*` wants a dot in the file name.
    let images = Matcher::include(&["app/images/**/*.*"])?;
    assert_eq!(
        paths(&images, &fs),
        vec!["app/images/icons/menu.svg", "app/images/logo.png"]
    );
    Ok(())
}

#[test]
fn wildcards_skip_dot_prefixed_components() -> TestResult {
    let fs = tree();
    fs.add_file("app/fonts/.gitkeep", "");
    fs.add_file("app/styles/css/.scratch.css", "");

    let images = Matcher::include(layout::IMAGE_SOURCES)?;
    assert_eq!(
        paths(&images, &fs),
        vec!["app/images/icons/menu.svg", "app/images/logo.png"]
    );
    assert!(!images.is_match("app/images/.gitkeep"));

    let fonts = Matcher::include(layout::FONT_SOURCES)?;
    assert!(paths(&fonts, &fs).is_empty());

    let styles = Matcher::include(layout::STYLE_SOURCES)?;
    assert_eq!(
        paths(&styles, &fs),
        vec!["app/styles/css/base.css", "app/styles/libs/normalize.css"]
    );

    // Spelling the dot out selects the file.
    let hidden = Matcher::include(&["app/images/.*"])?;
    assert_eq!(paths(&hidden, &fs), vec!["app/images/.gitkeep"]);
    let thumbs = Matcher::include(&["app/images/.thumbs/**/*"])?;
    assert_eq!(paths(&thumbs, &fs), vec!["app/images/.thumbs/logo.png"]);
    Ok(())
}

#[test]
fn missing_literal_include_is_an_error_but_empty_glob_is_not() -> TestResult {
    let fs = tree();

    let bundle = Matcher::include(&["app/styles/main.css"])?;
    assert_eq!(paths(&bundle, &fs), vec!["app/styles/main.css"]);

    let missing = Matcher::include(&["app/scripts/main.js"])?;
    let err = missing
        .collect(&fs, Path::new("."), None)
        .expect_err("literal file is absent");
    assert!(matches!(err, AssetflowError::MissingRoot(ref path) if path.ends_with("app/scripts/main.js")));

    let empty = Matcher::include(&["app/scripts/js/*.js"])?;
    assert!(empty.collect(&fs, Path::new("."), None)?.is_empty());
    Ok(())
}

#[test]
fn records_keep_their_glob_base() -> TestResult {
    let fs = tree();
    let images = Matcher::include(&["app/images/**/*.*"])?;
    let records = images.collect(&fs, Path::new("."), None)?;

    let menu = records
        .iter()
        .find(|r| r.path == "app/images/icons/menu.svg")
        .expect("menu.svg matched");
    assert_eq!(menu.base, "app/images");
    assert_eq!(menu.relative(), "icons/menu.svg");
    assert_eq!(menu.text(), "app/images/icons/menu.svg");
    Ok(())
}

#[test]
fn since_keeps_only_strictly_newer_files() -> TestResult {
    let fs = tree();
    let matcher = Matcher::include(&["app/styles/less/**/*.less"])?;

    let cutoff = fs.now();
    fs.add_file("app/styles/less/base.less", "body {}");

    let records = matcher.collect(&fs, Path::new("."), Some(cutoff))?;
    let changed: Vec<&str> = records.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(changed, vec!["app/styles/less/base.less"]);
    Ok(())
}

#[test]
fn missing_pattern_base_matches_nothing_but_missing_root_fails() -> TestResult {
    let fs = tree();
    let matcher = Matcher::include(&["app/fonts/**/*.*"])?;
    assert!(matcher.collect(&fs, Path::new("."), None)?.is_empty());

    let err = matcher
        .collect(&fs, Path::new("elsewhere"), None)
        .expect_err("root does not exist");
    assert!(matches!(err, AssetflowError::MissingRoot(_)));
    Ok(())
}

#[test]
fn orderer_ranks_by_first_matching_pattern_then_path() -> TestResult {
    let orderer = Orderer::new(&[
        "app/styles/libs/*.css",
        "app/styles/css/reset.css",
        "app/styles/css/base.css",
    ])?;

    let input = vec![
        record("app/styles/css/base.css", ""),
        record("app/styles/css/extra.css", ""),
        record("app/styles/libs/zz.css", ""),
        record("app/styles/css/reset.css", ""),
        record("app/styles/libs/aa.css", ""),
    ];
    let ordered: Vec<String> = orderer.order(input.clone()).into_iter().map(|r| r.path).collect();
    assert_eq!(
        ordered,
        vec![
            "app/styles/libs/aa.css",
            "app/styles/libs/zz.css",
            "app/styles/css/reset.css",
            "app/styles/css/base.css",
            "app/styles/css/extra.css",
        ]
    );

    let dropped: Vec<String> = orderer
        .with_policy(UnmatchedPolicy::Drop)
        .order(input)
        .into_iter()
        .map(|r| r.path)
        .collect();
    assert_eq!(dropped.len(), 4);
    assert!(!dropped.contains(&"app/styles/css/extra.css".to_string()));
    Ok(())
}

#[test]
fn remember_returns_union_with_latest_contents() {
    let cache = BucketCache::new();

    let all = cache.remember(
        "scripts",
        vec![record("a.js", "a1"), record("b.js", "b1"), record("c.js", "c1")],
    );
    assert_eq!(all.len(), 3);

    let again = cache.remember("scripts", vec![record("b.js", "b2")]);
    let texts: Vec<(String, String)> = again.iter().map(|r| (r.path.clone(), r.text())).collect();
    assert_eq!(
        texts,
        vec![
            ("a.js".to_string(), "a1".to_string()),
            ("b.js".to_string(), "b2".to_string()),
            ("c.js".to_string(), "c1".to_string()),
        ]
    );

    // Buckets are independent.
    assert!(cache.is_empty("styles"));
    assert_eq!(cache.paths("scripts"), vec!["a.js", "b.js", "c.js"]);
}

#[test]
fn vlq_encoding_matches_known_values() {
    let encode = |v: i64| {
        let mut s = String::new();
        encode_vlq(v, &mut s);
        s
    };
    assert_eq!(encode(0), "A");
    assert_eq!(encode(1), "C");
    assert_eq!(encode(-1), "D");
    assert_eq!(encode(-2), "F");
    assert_eq!(encode(16), "gB");
}

#[test]
fn concat_joins_fragments_and_maps_every_line() {
    let fragments = vec![
        record("app/scripts/libs/lib.js", "var a;\nvar b;\nvar c;"),
        record("app/scripts/js/app.js", "run();"),
    ];

    let bundle = concat(&fragments, "app/scripts/main.js", true).expect("non-empty input");
    assert_eq!(bundle.path, "app/scripts/main.js");
    assert_eq!(bundle.base, "app/scripts");
    assert_eq!(bundle.text(), "var a;\nvar b;\nvar c;\nrun();");

    let map = bundle.source_map.expect("map requested");
    assert_eq!(map.version, 3);
    assert_eq!(map.file, "main.js");
    assert_eq!(map.sources, vec!["libs/lib.js", "js/app.js"]);
    assert_eq!(map.sources_content[1], "run();");
    assert_eq!(map.mappings, "AAAA;AACA;AACA;ACFA");
}

#[test]
fn concat_of_nothing_produces_no_bundle() {
    assert!(concat(&[], "app/styles/main.css", true).is_none());
}

#[test]
fn relative_path_climbs_out_of_the_bundle_directory() {
    assert_eq!(relative_path("app/styles", "app/styles/css/base.css"), "css/base.css");
    assert_eq!(relative_path("app/styles", "app/vendor/x.css"), "../vendor/x.css");
    assert_eq!(relative_path("", "app/x.css"), "app/x.css");
}

#[test]
fn source_map_json_uses_camel_case() -> TestResult {
    let bundle = concat(&[record("app/a.css", "a {}")], "app/main.css", true).expect("bundle");
    let json = bundle.source_map.expect("map").to_json()?;
    let value: serde_json::Value = serde_json::from_str(&json)?;

    assert_eq!(value["version"], 3);
    assert_eq!(value["sourcesContent"][0], "a {}");
    assert_eq!(value["mappings"], "AAAA");

    assert_eq!(
        SourceMap::url_comment("main.css.map", Some("css")),
        "\n/*# sourceMappingURL=main.css.map */\n"
    );
    assert_eq!(
        SourceMap::url_comment("main.js.map", Some("js")),
        "\n//# sourceMappingURL=main.js.map\n"
    );
    Ok(())
}

#[tokio::test]
async fn path_and_text_steps_compose_in_order() -> TestResult {
    let cancel = CancellationToken::new();
    let steps: Vec<Arc<dyn Transform>> = vec![
        Arc::new(Replace::new("main.css", "main.min.css")),
        Arc::new(SetExtension::new("htm")),
        Arc::new(RenameSuffix::new(".min")),
    ];

    let input = vec![record("app/index.html", "<link href=\"main.css\"> main.css")];
    let out = apply_steps("test", &steps, input, &cancel).await?;

    assert_eq!(out[0].path, "app/index.min.htm");
    assert_eq!(out[0].text(), "<link href=\"main.min.css\"> main.min.css");
    Ok(())
}

#[tokio::test]
async fn cancelled_steps_do_not_run() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let steps: Vec<Arc<dyn Transform>> = vec![Arc::new(RenameSuffix::new(".min"))];

    let err = apply_steps("dist:styles", &steps, vec![record("main.css", "")], &cancel)
        .await
        .expect_err("cancelled before the first record");
    assert!(err.is_cancelled());
}

#[test]
fn write_records_places_files_and_maps_under_destination() -> TestResult {
    let fs = MockFileSystem::new();
    let cancel = CancellationToken::new();
    let root = Path::new(".");

    let bundle = concat(
        &[record("app/styles/css/base.css", "body {}")],
        "app/styles/main.css",
        true,
    )
    .expect("bundle");

    let written = write_records(&fs, root, "app/styles", vec![bundle], "dev:styles", &cancel)?;
    assert_eq!(written, vec!["app/styles/main.css.map", "app/styles/main.css"]);
    assert_eq!(
        fs.read_to_string(Path::new("app/styles/main.css"))?,
        "body {}\n/*# sourceMappingURL=main.css.map */\n"
    );

    let map: SourceMap = serde_json::from_str(&fs.read_to_string(Path::new("app/styles/main.css.map"))?)?;
    assert_eq!(map.sources, vec!["css/base.css"]);
    Ok(())
}

#[test]
fn cancelled_write_leaves_nothing_behind() {
    let fs = MockFileSystem::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = write_records(
        &fs,
        Path::new("."),
        "dist",
        vec![record("app/index.html", "<html/>")],
        "dist:html",
        &cancel,
    )
    .expect_err("cancelled");
    assert!(err.is_cancelled());
    assert!(fs.files().is_empty());
}

#[test]
fn deletion_helpers_remove_only_what_they_select() -> TestResult {
    let fs = tree();
    fs.add_file("dist/index.html", "x");
    let root = Path::new(".");

    let generated = Matcher::include(layout::DEV_GENERATED)?;
    let deleted = delete_matching(&fs, root, &generated, "dev:clean")?;
    assert_eq!(deleted.len(), 2);
    assert!(!fs.exists(Path::new("app/styles/main.css")));
    assert!(!fs.exists(Path::new("app/styles/css/base.css")));
    assert!(fs.exists(Path::new("app/styles/libs/normalize.css")));

    assert!(delete_dir(&fs, root, "dist", "dist:clean")?);
    assert!(!fs.exists(Path::new("dist/index.html")));
    assert!(!delete_dir(&fs, root, "dist", "dist:clean")?);

    Ok(())
}
