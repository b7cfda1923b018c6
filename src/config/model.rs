// src/config/model.rs

use serde::{Deserialize, Deserializer};

use crate::config::options::BuildOptionsOverrides;
use crate::errors::{BundleWatchError, Result};
use crate::types::TargetKind;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [config]
/// batch_delay = 250
/// debug = false
///
/// [bundler]
/// cmd = "jspm bundle {entry} {output}"
///
/// [app]
/// watch = ["src/**/*.js", "src/**/*.html"]
/// input = "src/main.js"
/// output = "dist/app.js"
///
/// [tests]
/// watch = "test/**/*.spec.js"
/// input = "test/index.js"
/// output = "dist/tests.js"
/// ```
///
/// Only `[bundler]` and `[app].watch` are mandatory; everything else has a
/// default.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    #[serde(default)]
    pub project: ProjectSection,

    #[serde(default)]
    pub bundler: Option<BundlerSection>,

    #[serde(default)]
    pub app: TargetConfig,

    #[serde(default)]
    pub tests: TargetConfig,
}

/// Validated configuration.
///
/// Construct via `ConfigFile::try_from(raw)` (see `validate.rs`), which
/// guarantees a bundler is configured, `[app].watch` is non-empty and at
/// least one target is buildable.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    config: ConfigSection,
    project: ProjectSection,
    bundler: BundlerSection,
    app: TargetConfig,
    tests: TargetConfig,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        config: ConfigSection,
        project: ProjectSection,
        bundler: BundlerSection,
        app: TargetConfig,
        tests: TargetConfig,
    ) -> Self {
        Self {
            config,
            project,
            bundler,
            app,
            tests,
        }
    }

    pub fn global(&self) -> &ConfigSection {
        &self.config
    }

    pub fn project(&self) -> &ProjectSection {
        &self.project
    }

    pub fn bundler(&self) -> &BundlerSection {
        &self.bundler
    }

    pub fn target(&self, kind: TargetKind) -> &TargetConfig {
        match kind {
            TargetKind::App => &self.app,
            TargetKind::Tests => &self.tests,
        }
    }

    /// Decide which targets take part in this run.
    ///
    /// A target is enabled when it has both `input` and `output` and is not
    /// forced off by `flags`.
    pub fn enabled_targets(&self, flags: StartFlags) -> Result<EnabledTargets> {
        if flags.app_only && flags.tests_only {
            return Err(BundleWatchError::ConfigError(
                "--app-only and --tests-only are mutually exclusive".to_string(),
            ));
        }

        let enabled = EnabledTargets {
            app: self.app.is_buildable() && !flags.tests_only,
            tests: self.tests.is_buildable() && !flags.app_only,
        };

        if !enabled.app && !enabled.tests {
            return Err(BundleWatchError::NothingToBuild);
        }

        Ok(enabled)
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Quiet period (ms) after the last relevant change before a build runs.
    #[serde(default = "default_batch_delay")]
    pub batch_delay: u64,

    /// Verbose logging.
    #[serde(default)]
    pub debug: bool,
}

fn default_batch_delay() -> u64 {
    250
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            batch_delay: default_batch_delay(),
            debug: false,
        }
    }
}

/// `[project]` section: where project metadata lives.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    #[serde(default = "default_package_json")]
    pub package_json: String,
}

fn default_package_json() -> String {
    "package.json".to_string()
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            package_json: default_package_json(),
        }
    }
}

/// `[bundler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BundlerSection {
    /// Command template; `{entry}` and `{output}` are substituted.
    pub cmd: String,

    /// Regex matched against each stdout line of the bundler; the first
    /// capture group names a module that is part of the bundle graph.
    #[serde(default)]
    pub trace_on_stdout: Option<String>,
}

/// `[app]` / `[tests]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TargetConfig {
    #[serde(default, deserialize_with = "one_or_many")]
    pub watch: Vec<String>,

    #[serde(default)]
    pub input: Option<String>,

    #[serde(default)]
    pub output: Option<String>,

    #[serde(default, deserialize_with = "one_or_many")]
    pub ignore: Vec<String>,

    #[serde(default)]
    pub build_options: BuildOptionsOverrides,
}

impl TargetConfig {
    /// Absence of either `input` or `output` disables the target.
    pub fn is_buildable(&self) -> bool {
        self.input.is_some() && self.output.is_some()
    }
}

/// Forces one target off for a single run (`--app-only` / `--tests-only`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StartFlags {
    pub app_only: bool,
    pub tests_only: bool,
}

/// Which targets are built in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnabledTargets {
    pub app: bool,
    pub tests: bool,
}

impl EnabledTargets {
    pub fn is_enabled(&self, kind: TargetKind) -> bool {
        match kind {
            TargetKind::App => self.app,
            TargetKind::Tests => self.tests,
        }
    }
}

/// Accept either `watch = "a/**"` or `watch = ["a/**", "b/**"]`.
fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}
