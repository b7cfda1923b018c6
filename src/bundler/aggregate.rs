// src/bundler/aggregate.rs

//! The synthetic test entry: one import per test file, bundled as the single
//! entry point of the test bundle and removed again once the bundle is
//! written.

use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use tracing::debug;

use crate::fs::FileSystem;
use crate::watch::patterns::{TestFileMatcher, collect_test_files};

/// How to (re)generate and wire up the import aggregate for one test build.
#[derive(Debug, Clone)]
pub struct AggregatePlan {
    /// Path of the aggregate source file (the tests target's input).
    pub entry: PathBuf,
    /// Project root test patterns are relative to.
    pub root: PathBuf,
    pub matcher: TestFileMatcher,
    /// Directories never searched for test files.
    pub skip_dirs: Vec<PathBuf>,
    /// The set of test files changed since the aggregate was last written.
    pub regenerate: bool,
    /// Module name the runtime loader imports to start the tests.
    pub loader_module: String,
}

/// Write the aggregate for every test file currently on disk.
///
/// Returns the number of imports written.
pub fn write_aggregate(fs: &dyn FileSystem, plan: &AggregatePlan) -> Result<usize> {
    let files = collect_test_files(fs, &plan.root, &plan.matcher, &plan.skip_dirs)
        .context("listing test files")?;
    let files: Vec<PathBuf> = files.into_iter().filter(|f| f != &plan.entry).collect();

    let entry_dir = plan.entry.parent().unwrap_or(Path::new(""));
    let source = render_aggregate(entry_dir, &files);
    fs.write(&plan.entry, source.as_bytes())
        .with_context(|| format!("writing test aggregate {:?}", plan.entry))?;

    debug!(entry = ?plan.entry, imports = files.len(), "wrote test import aggregate");
    Ok(files.len())
}

/// One `import './x.spec.js';` line per file, relative to `entry_dir`.
pub fn render_aggregate(entry_dir: &Path, files: &[PathBuf]) -> String {
    let mut out = String::new();
    for file in files {
        out.push_str(&format!("import '{}';\n", relative_import(entry_dir, file)));
    }
    out
}

/// Statement appended to the test bundle so loading it runs the tests.
pub fn loader_trailer(loader_module: &str) -> String {
    format!("\nSystem.import('{loader_module}');\n")
}

fn relative_import(from_dir: &Path, file: &Path) -> String {
    let from: Vec<Component> = from_dir.components().collect();
    let to: Vec<Component> = file.components().collect();
    let common = from.iter().zip(to.iter()).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = Vec::new();
    for _ in common..from.len() {
        parts.push("..".to_string());
    }
    for c in &to[common..] {
        parts.push(c.as_os_str().to_string_lossy().into_owned());
    }

    let joined = parts.join("/");
    if joined.starts_with("..") {
        joined
    } else {
        format!("./{joined}")
    }
}
