// tests/dev_build.rs

mod common;
use crate::common::{init_tracing, ConfigFileBuilder, ProjectFixture, TestResult};

use assetflow::engine::TaskState;
use assetflow::pipeline::SourceMap;
use assetflow::tasks::dev;
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn dev_less_compiles_all_but_variables() -> TestResult {
    init_tracing();
    let project = ProjectFixture::standard();
    let runner = project.runner(&ConfigFileBuilder::new().build());

    runner.run(dev::LESS, &CancellationToken::new()).await?;

    assert!(project.exists("app/styles/css/base.css"));
    assert!(project.exists("app/styles/css/reset.css"));
    assert!(!project.exists("app/styles/css/variables.css"));
    assert_eq!(project.read("app/styles/css/base.css"), "body { color: black; }");
    Ok(())
}

#[tokio::test]
async fn dev_build_orders_rewrites_and_maps_styles() -> TestResult {
    init_tracing();
    let project = ProjectFixture::standard();
    let runner = project.runner(&ConfigFileBuilder::new().build());

    runner.run(dev::BUILD, &CancellationToken::new()).await?;

    let css = project.read("app/styles/main.css");
    let normalize = css.find("html {").expect("normalize.css in bundle");
    let reset = css.find("* { margin").expect("reset in bundle");
    let base = css.find("body {").expect("base in bundle");
    assert!(normalize < reset && reset < base, "unexpected order:\n{css}");

    assert!(css.contains("url(\"../images/bg.png\")"));
    assert!(!css.contains("../../"));
    assert!(css.ends_with("\n/*# sourceMappingURL=main.css.map */\n"));

    let map: SourceMap = serde_json::from_str(&project.read("app/styles/main.css.map"))?;
    assert_eq!(map.file, "main.css");
    assert_eq!(
        map.sources,
        vec!["libs/normalize.css", "css/reset.css", "css/base.css"]
    );

    assert_eq!(runner.state_of(dev::BUILD), TaskState::Succeeded);
    Ok(())
}

#[tokio::test]
async fn dev_build_bundles_scripts_libraries_first() -> TestResult {
    let project = ProjectFixture::standard();
    let runner = project.runner(&ConfigFileBuilder::new().build());

    runner.run(dev::BUILD, &CancellationToken::new()).await?;

    assert_eq!(
        project.read("app/scripts/main.js"),
        "var jQuery = {};\nconsole.log(\"app\");\nconsole.log(\"menu\");\n//# sourceMappingURL=main.js.map\n"
    );
    let map: SourceMap = serde_json::from_str(&project.read("app/scripts/main.js.map"))?;
    assert_eq!(map.sources, vec!["libs/jquery.js", "js/app.js", "js/menu.js"]);
    assert_eq!(map.mappings, "AAAA;ACAA;ACAA");
    Ok(())
}

#[tokio::test]
async fn dev_build_is_repeatable() -> TestResult {
    let project = ProjectFixture::standard();
    let cfg = ConfigFileBuilder::new().build();
    let cancel = CancellationToken::new();

    let runner = project.runner(&cfg);
    runner.run(dev::BUILD, &cancel).await?;
    let css = project.read("app/styles/main.css");
    let js = project.read("app/scripts/main.js");

    // Same process: nothing changed, the buckets still hold every fragment.
    runner.run(dev::BUILD, &cancel).await?;
    assert_eq!(project.read("app/styles/main.css"), css);
    assert_eq!(project.read("app/scripts/main.js"), js);

    // Fresh process over the same tree.
    project.runner(&cfg).run(dev::BUILD, &cancel).await?;
    assert_eq!(project.read("app/styles/main.css"), css);
    assert_eq!(project.read("app/scripts/main.js"), js);
    Ok(())
}

#[tokio::test]
async fn incremental_rebuild_matches_a_full_build() -> TestResult {
    let project = ProjectFixture::standard();
    let cfg = ConfigFileBuilder::new().build();
    let cancel = CancellationToken::new();

    let runner = project.runner(&cfg);
    runner.run(dev::BUILD, &cancel).await?;

    project.write("app/scripts/js/app.js", "console.log(\"app v2\");");
    runner.run(dev::SCRIPTS, &cancel).await?;
    let incremental = project.read("app/scripts/main.js");
    assert!(incremental.contains("app v2"));
    assert!(incremental.contains("var jQuery"));
    assert!(incremental.contains("menu"));

    project.runner(&cfg).run(dev::SCRIPTS, &cancel).await?;
    assert_eq!(project.read("app/scripts/main.js"), incremental);
    Ok(())
}

#[tokio::test]
async fn last_run_is_only_recorded_on_success() -> TestResult {
    let project = ProjectFixture::standard();
    let runner = project.runner(&ConfigFileBuilder::new().build());

    assert!(runner.build().last_run(dev::SCRIPTS).is_none());
    runner.run(dev::SCRIPTS, &CancellationToken::new()).await?;
    let first = runner.build().last_run(dev::SCRIPTS).expect("recorded");

    let cancelled = CancellationToken::new();
    cancelled.cancel();
    let err = runner
        .run(dev::SCRIPTS, &cancelled)
        .await
        .expect_err("cancelled before start");
    assert!(err.is_cancelled());
    assert_eq!(runner.build().last_run(dev::SCRIPTS), Some(first));
    Ok(())
}

#[tokio::test]
async fn dev_clean_removes_generated_files_only() -> TestResult {
    let project = ProjectFixture::standard();
    let runner = project.runner(&ConfigFileBuilder::new().build());
    let cancel = CancellationToken::new();

    runner.run(dev::BUILD, &cancel).await?;
    runner.run(dev::CLEAN, &cancel).await?;

    for generated in [
        "app/styles/main.css",
        "app/styles/main.css.map",
        "app/styles/css/base.css",
        "app/scripts/main.js",
        "app/scripts/main.js.map",
    ] {
        assert!(!project.exists(generated), "{generated} survived dev:clean");
    }
    assert!(project.exists("app/styles/libs/normalize.css"));
    assert!(project.exists("app/scripts/js/app.js"));
    assert!(project.exists("app/styles/less/base.less"));
    Ok(())
}

#[tokio::test]
async fn empty_project_builds_nothing() -> TestResult {
    let project = ProjectFixture::empty();
    project.write("app/index.html", "<html></html>");
    let runner = project.runner(&ConfigFileBuilder::new().build());

    runner.run(dev::BUILD, &CancellationToken::new()).await?;

    assert!(!project.exists("app/styles/main.css"));
    assert!(!project.exists("app/scripts/main.js"));
    Ok(())
}
