// src/watch/patterns.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::config::{ConfigFile, EngineSettings};
use crate::fs::FileSystem;
use crate::types::TargetKind;
use crate::watch::path_utils::relative_str;

/// Decides whether a project-relative path is a test file.
///
/// NOTE: a path counts as a test file only if it matches *every* configured
/// `[tests].watch` pattern. With a single pattern this is the usual glob
/// test; with two or more it almost never matches, so such setups end up
/// routing test files through the application target. An any-match rule was
/// most likely intended, but the all-match rule stays until that is
/// confirmed.
#[derive(Debug, Clone, Default)]
pub struct TestFileMatcher {
    matchers: Vec<GlobMatcher>,
    /// `[tests].ignore`; only consulted when listing test files.
    ignore: Option<GlobSet>,
}

impl TestFileMatcher {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let matchers = patterns
            .iter()
            .map(|pat| {
                Glob::new(pat)
                    .map(|g| g.compile_matcher())
                    .with_context(|| format!("invalid tests glob pattern: {pat}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            matchers,
            ignore: None,
        })
    }

    pub fn with_ignore(mut self, patterns: &[String]) -> Result<Self> {
        self.ignore = if patterns.is_empty() {
            None
        } else {
            Some(build_globset(patterns).context("building tests ignore globset")?)
        };
        Ok(self)
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        !self.matchers.is_empty() && self.matchers.iter().all(|m| m.is_match(rel_path))
    }

    pub fn is_ignored(&self, rel_path: &str) -> bool {
        self.ignore.as_ref().is_some_and(|set| set.is_match(rel_path))
    }

    /// Deepest literal directory prefix among the patterns, relative to the
    /// root. Every test file lies below it since it must match all patterns.
    pub fn search_dir(&self) -> PathBuf {
        self.matchers
            .iter()
            .map(|m| literal_dir(m.glob().glob()))
            .max_by_key(|dir| dir.components().count())
            .unwrap_or_default()
    }
}

/// Leading directory components of `pattern` that contain no glob syntax.
fn literal_dir(pattern: &str) -> PathBuf {
    let mut parts: Vec<&str> = pattern.split('/').collect();
    parts.pop(); // the file name part

    let mut dir = PathBuf::new();
    for part in parts {
        if part.is_empty() || part == "." {
            continue;
        }
        if part.contains(['*', '?', '[', '{', '\\']) {
            break;
        }
        dir.push(part);
    }
    dir
}

/// Which raw filesystem paths get forwarded to the engine at all.
///
/// A path passes when it is the dependency-configuration file, or when it
/// matches any `[app]`/`[tests]` watch pattern and none of the ignore
/// patterns. Bundle outputs, the synthetic test aggregate and the
/// installed-packages directory are always ignored.
#[derive(Clone)]
pub struct WatchFilter {
    root: PathBuf,
    config_file: PathBuf,
    watch_set: GlobSet,
    ignore_set: Option<GlobSet>,
    ignored_files: Vec<PathBuf>,
    ignored_dirs: Vec<PathBuf>,
}

impl fmt::Debug for WatchFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchFilter")
            .field("root", &self.root)
            .field("config_file", &self.config_file)
            .finish_non_exhaustive()
    }
}

impl WatchFilter {
    pub fn from_settings(cfg: &ConfigFile, settings: &EngineSettings) -> Result<Self> {
        let app = cfg.target(TargetKind::App);
        let tests = cfg.target(TargetKind::Tests);

        let watch: Vec<String> = app.watch.iter().chain(tests.watch.iter()).cloned().collect();
        let ignore: Vec<String> = app.ignore.iter().chain(tests.ignore.iter()).cloned().collect();

        let watch_set = build_globset(&watch).context("building watch globset")?;
        let ignore_set = if ignore.is_empty() {
            None
        } else {
            Some(build_globset(&ignore).context("building ignore globset")?)
        };

        let mut ignored_files = Vec::new();
        for target in [&settings.app, &settings.tests].into_iter().flatten() {
            ignored_files.push(target.output.clone());
        }
        if let Some(tests) = &settings.tests {
            ignored_files.push(tests.input.clone());
        }

        Ok(Self {
            root: settings.root.clone(),
            config_file: settings.layout.config_file.clone(),
            watch_set,
            ignore_set,
            ignored_files,
            ignored_dirs: vec![settings.layout.packages_dir.clone()],
        })
    }

    pub fn accepts(&self, path: &Path) -> bool {
        if path == self.config_file {
            return true;
        }
        if self.ignored_files.iter().any(|p| p == path)
            || self.ignored_dirs.iter().any(|d| path.starts_with(d))
        {
            return false;
        }
        let Some(rel) = relative_str(&self.root, path) else {
            return false;
        };
        if !self.watch_set.is_match(&rel) {
            return false;
        }
        match &self.ignore_set {
            Some(ignore) => !ignore.is_match(&rel),
            None => true,
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}

/// Collect every test file under `root`.
///
/// The walk starts at the matcher's literal directory prefix and never enters
/// `skip_dirs` or directories matched by the tests ignore globs. Blocking;
/// async callers should run it on the blocking pool. Results are sorted so
/// the generated import aggregate is stable.
pub fn collect_test_files(
    fs: &dyn FileSystem,
    root: &Path,
    matcher: &TestFileMatcher,
    skip_dirs: &[PathBuf],
) -> Result<Vec<PathBuf>> {
    let prefix = matcher.search_dir();
    let start = if prefix.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(prefix)
    };
    if !fs.is_dir(&start) {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    let mut stack = vec![start];

    while let Some(dir) = stack.pop() {
        for path in fs.read_dir(&dir)? {
            let Some(rel) = relative_str(root, &path) else {
                continue;
            };
            if matcher.is_ignored(&rel) {
                continue;
            }
            if fs.is_dir(&path) {
                if !skip_dirs.iter().any(|d| d == &path) {
                    stack.push(path);
                }
            } else if fs.is_file(&path) && matcher.matches(&rel) {
                files.push(path);
            }
        }
    }

    files.sort();
    Ok(files)
}
