// src/build/state.rs

use crate::build::changes::ChangedModules;
use crate::types::TargetKind;

/// Mutable build record for one target.
///
/// Recreated on every engine (re)initialization, which is also the only way
/// `is_full_rebuild` is re-armed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildState {
    pub kind: TargetKind,
    /// Next build starts from scratch (first build after (re)initialization).
    pub is_full_rebuild: bool,
    /// Last build attempt failed; any change for this target is build-worthy
    /// until a build succeeds again.
    pub has_error: bool,
    /// Changes since the last successful build. Kept on failure.
    pub changed_modules: ChangedModules,
    pub in_progress: bool,
    /// Tests only: the import aggregate must be regenerated before the next
    /// build.
    pub import_aggregate_stale: bool,
}

impl BuildState {
    pub fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            is_full_rebuild: true,
            has_error: false,
            changed_modules: ChangedModules::new(),
            in_progress: false,
            import_aggregate_stale: kind == TargetKind::Tests,
        }
    }

    /// Record the start of a bundler invocation.
    pub fn begin(&mut self) {
        self.in_progress = true;
    }

    /// Record the outcome of a bundler invocation.
    pub fn finish(&mut self, success: bool) {
        if success {
            self.has_error = false;
            self.changed_modules.clear();
        } else {
            self.has_error = true;
        }
        self.is_full_rebuild = false;
        self.in_progress = false;
    }
}
