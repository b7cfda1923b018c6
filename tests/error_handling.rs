// tests/error_handling.rs

use std::io::Write;
use tempfile::NamedTempFile;
use bundlewatch::config::{StartFlags, load_and_validate};
use bundlewatch::errors::BundleWatchError;
use bundlewatch::types::TargetKind;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

#[test]
fn test_valid_config_loads() {
    let file = config_file(
        r#"
[config]
batch_delay = 100

[bundler]
cmd = "jspm bundle {entry} {output}"

[app]
watch = ["src/**/*.js", "src/**/*.html"]
input = "src/main.js"
output = "dist/app.js"

[app.build_options]
minify = true

[tests]
watch = "test/**/*.spec.js"
input = "test/index.js"
output = "dist/tests.js"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("valid config");
    assert_eq!(cfg.global().batch_delay, 100);
    assert_eq!(cfg.target(TargetKind::App).watch.len(), 2);
    assert_eq!(cfg.target(TargetKind::App).build_options.minify, Some(true));
    assert_eq!(cfg.target(TargetKind::Tests).watch, vec!["test/**/*.spec.js"]);
}

#[test]
fn test_missing_bundler_is_rejected() {
    let file = config_file(
        r#"
[app]
watch = "src/**/*.js"
input = "src/main.js"
output = "dist/app.js"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BundleWatchError::MissingBundler) => {}
        other => panic!("Expected MissingBundler, got: {:?}", other),
    }
}

#[test]
fn test_missing_app_watch_is_rejected() {
    let file = config_file(
        r#"
[bundler]
cmd = "bundle"

[app]
input = "src/main.js"
output = "dist/app.js"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BundleWatchError::NoWatchTarget) => {}
        other => panic!("Expected NoWatchTarget, got: {:?}", other),
    }
}

#[test]
fn test_nothing_buildable_is_rejected() {
    let file = config_file(
        r#"
[bundler]
cmd = "bundle"

[app]
watch = "src/**/*.js"
input = "src/main.js"

[tests]
output = "dist/tests.js"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BundleWatchError::NothingToBuild) => {}
        other => panic!("Expected NothingToBuild, got: {:?}", other),
    }
}

#[test]
fn test_invalid_glob_returns_glob_error() {
    let file = config_file(
        r#"
[bundler]
cmd = "bundle"

[app]
watch = "src/[.js"
input = "src/main.js"
output = "dist/app.js"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BundleWatchError::GlobError(_)) => {}
        other => panic!("Expected GlobError, got: {:?}", other),
    }
}

#[test]
fn test_invalid_trace_regex_returns_config_error() {
    let file = config_file(
        r#"
[bundler]
cmd = "bundle"
trace_on_stdout = "(unclosed"

[app]
watch = "src/**/*.js"
input = "src/main.js"
output = "dist/app.js"
"#,
    );

    match load_and_validate(file.path()) {
        Err(BundleWatchError::ConfigError(msg)) => assert!(msg.contains("trace_on_stdout")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn test_app_only_without_app_target_has_nothing_to_build() {
    let file = config_file(
        r#"
[bundler]
cmd = "bundle"

[app]
watch = "src/**/*.js"

[tests]
watch = "test/**/*.spec.js"
input = "test/index.js"
output = "dist/tests.js"
"#,
    );

    let cfg = load_and_validate(file.path()).expect("tests target alone is buildable");
    let flags = StartFlags {
        app_only: true,
        tests_only: false,
    };
    match cfg.enabled_targets(flags) {
        Err(BundleWatchError::NothingToBuild) => {}
        other => panic!("Expected NothingToBuild, got: {:?}", other),
    }
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let file = config_file("[bundler\ncmd = ");
    match load_and_validate(file.path()) {
        Err(BundleWatchError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}
