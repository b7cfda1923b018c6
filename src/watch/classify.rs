// src/watch/classify.rs

//! Which target a changed path belongs to, and under what module name.

use std::path::Path;

use crate::build::module_name;
use crate::config::EngineSettings;
use crate::types::TargetKind;
use crate::watch::path_utils::relative_str;

/// A path resolved to a target's module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleChange {
    pub target: TargetKind,
    pub module: String,
    /// Matched the test-file patterns (as opposed to landing in `tests` only
    /// because the application target is disabled).
    pub is_test_file: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A test file while the tests target is disabled.
    Skip,
    Module(ModuleChange),
}

/// Classify a changed path.
///
/// The dependency-configuration file never gets here; the engine diverts it
/// beforehand.
///
/// 1. Test files go to `tests` (or are skipped when tests are disabled),
///    named relative to the tests input directory.
/// 2. Anything else goes to `app`, named relative to the app input directory,
///    unless the app target is disabled, in which case it goes to `tests`.
pub fn classify(settings: &EngineSettings, path: &Path) -> Classification {
    let is_test_file = relative_str(&settings.root, path)
        .map(|rel| settings.test_files.matches(&rel))
        .unwrap_or(false);

    if is_test_file {
        return match &settings.tests {
            Some(tests) => Classification::Module(ModuleChange {
                target: TargetKind::Tests,
                module: module_name(path, &tests.input_dir),
                is_test_file: true,
            }),
            None => Classification::Skip,
        };
    }

    match (&settings.app, &settings.tests) {
        (Some(app), _) => Classification::Module(ModuleChange {
            target: TargetKind::App,
            module: module_name(path, &app.input_dir),
            is_test_file: false,
        }),
        (None, Some(tests)) => Classification::Module(ModuleChange {
            target: TargetKind::Tests,
            module: module_name(path, &tests.input_dir),
            is_test_file: false,
        }),
        (None, None) => Classification::Skip,
    }
}
