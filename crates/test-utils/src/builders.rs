#![allow(dead_code)]

use bundlewatch::config::{
    BundlerSection, ConfigFile, ConfigSection, ProjectSection, RawConfigFile, TargetConfig,
};

/// Builder for `ConfigFile` to simplify test setup.
///
/// Starts with a bundler command and nothing else; add targets with
/// [`ConfigFileBuilder::with_app`] / [`ConfigFileBuilder::with_tests`].
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                project: ProjectSection::default(),
                bundler: Some(BundlerSection {
                    cmd: "true".to_string(),
                    trace_on_stdout: None,
                }),
                app: TargetConfig::default(),
                tests: TargetConfig::default(),
            },
        }
    }

    pub fn without_bundler(mut self) -> Self {
        self.config.bundler = None;
        self
    }

    pub fn with_app(mut self, app: TargetConfig) -> Self {
        self.config.app = app;
        self
    }

    pub fn with_tests(mut self, tests: TargetConfig) -> Self {
        self.config.tests = tests;
        self
    }

    pub fn with_batch_delay(mut self, ms: u64) -> Self {
        self.config.config.batch_delay = ms;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `[app]` / `[tests]` sections.
pub struct TargetConfigBuilder {
    target: TargetConfig,
}

impl TargetConfigBuilder {
    pub fn new() -> Self {
        Self {
            target: TargetConfig::default(),
        }
    }

    pub fn watch(mut self, pattern: &str) -> Self {
        self.target.watch.push(pattern.to_string());
        self
    }

    pub fn ignore(mut self, pattern: &str) -> Self {
        self.target.ignore.push(pattern.to_string());
        self
    }

    pub fn input(mut self, path: &str) -> Self {
        self.target.input = Some(path.to_string());
        self
    }

    pub fn output(mut self, path: &str) -> Self {
        self.target.output = Some(path.to_string());
        self
    }

    pub fn minify(mut self, val: bool) -> Self {
        self.target.build_options.minify = Some(val);
        self
    }

    pub fn build(self) -> TargetConfig {
        self.target
    }
}

impl Default for TargetConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
