// src/config/settings.rs

//! Runtime settings for the engine: the validated config resolved against the
//! project root, the enabled targets and the current project layout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::model::{ConfigFile, StartFlags};
use crate::config::options::BuildOptions;
use crate::errors::Result;
use crate::project::ProjectLayout;
use crate::types::TargetKind;
use crate::watch::patterns::TestFileMatcher;

/// A buildable, enabled target.
#[derive(Debug, Clone)]
pub struct TargetSettings {
    pub kind: TargetKind,
    /// Bundle entry (for `tests`, the synthetic import aggregate).
    pub input: PathBuf,
    pub output: PathBuf,
    /// Directory module names for this target are resolved against.
    pub input_dir: PathBuf,
    pub options: BuildOptions,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub root: PathBuf,
    pub package_json: PathBuf,
    pub batch_delay: Duration,
    /// `None` when the target is disabled for this run.
    pub app: Option<TargetSettings>,
    pub tests: Option<TargetSettings>,
    pub test_files: TestFileMatcher,
    pub layout: ProjectLayout,
}

impl EngineSettings {
    pub fn from_config(
        cfg: &ConfigFile,
        root: &Path,
        flags: StartFlags,
        layout: ProjectLayout,
    ) -> Result<Self> {
        let enabled = cfg.enabled_targets(flags)?;

        let target = |kind: TargetKind| -> Option<TargetSettings> {
            if !enabled.is_enabled(kind) {
                return None;
            }
            let tc = cfg.target(kind);
            let input = root.join(tc.input.as_deref()?);
            let output = root.join(tc.output.as_deref()?);
            let input_dir = input
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| root.to_path_buf());
            Some(TargetSettings {
                kind,
                input,
                output,
                input_dir,
                options: BuildOptions::merged(&tc.build_options),
            })
        };

        Ok(Self {
            root: root.to_path_buf(),
            package_json: root.join(&cfg.project().package_json),
            batch_delay: Duration::from_millis(cfg.global().batch_delay),
            app: target(TargetKind::App),
            tests: target(TargetKind::Tests),
            test_files: TestFileMatcher::new(&cfg.target(TargetKind::Tests).watch)?
                .with_ignore(&cfg.target(TargetKind::Tests).ignore)?,
            layout,
        })
    }

    pub fn target(&self, kind: TargetKind) -> Option<&TargetSettings> {
        match kind {
            TargetKind::App => self.app.as_ref(),
            TargetKind::Tests => self.tests.as_ref(),
        }
    }

    pub fn is_enabled(&self, kind: TargetKind) -> bool {
        self.target(kind).is_some()
    }
}
