// src/engine/event_handlers.rs

//! Event handling logic for the core runtime: what a single filesystem event
//! does to the engine state.

use std::path::{Path, PathBuf};

use tokio::time::Instant;
use tracing::{debug, info};

use crate::engine::core::{CONFIG_CHANGE_DELAY, CoreRuntime, merge_build_targets};
use crate::engine::timer::TimerAction;
use crate::engine::{CoreCommand, CoreStep, Notification};
use crate::types::{ChangeKind, TargetKind};
use crate::watch::classify::{Classification, ModuleChange, classify};

impl CoreRuntime {
    /// Handle a filesystem change.
    ///
    /// Order matters:
    /// 1. A pending dependency-configuration reload absorbs every event and
    ///    extends its quiet period. The configuration file itself starts
    ///    such a reload.
    /// 2. While a build is running the event is queued verbatim.
    /// 3. Otherwise it is classified, gated and scheduled.
    pub(super) fn handle_file_event(
        &mut self,
        path: PathBuf,
        kind: ChangeKind,
        now: Instant,
        step: &mut CoreStep,
    ) {
        if self.processing_change || path == self.settings.layout.config_file {
            self.absorb_config_change(&path, now);
            return;
        }

        if self.any_in_progress() {
            self.queue.push(path, kind);
            return;
        }

        match classify(&self.settings, &path) {
            Classification::Skip => {
                debug!(?path, "test file changed while tests are disabled; skipping");
            }
            Classification::Module(change) => self.record_module_change(change, kind, now, step),
        }
    }

    fn absorb_config_change(&mut self, path: &Path, now: Instant) {
        if !self.processing_change {
            info!(?path, "dependency configuration changed; waiting for activity to settle");
            self.processing_change = true;
        } else {
            debug!(?path, "activity during configuration change; extending quiet period");
        }
        if self.reinit_pending {
            // Already due; it fires as soon as the running build finishes.
            return;
        }
        self.timer.arm(now + CONFIG_CHANGE_DELAY, TimerAction::Reinitialize);
    }

    /// Gate a classified change on build-worthiness and schedule a build.
    fn record_module_change(
        &mut self,
        change: ModuleChange,
        kind: ChangeKind,
        now: Instant,
        step: &mut CoreStep,
    ) {
        let ModuleChange {
            target,
            module,
            is_test_file,
        } = change;

        // Invalidation always runs; its result only matters for non-test files.
        let known = !self.graph.invalidate(&module).is_empty();
        let state = self.state_mut(target);
        let worthy = is_test_file || known || state.has_error;
        if !worthy {
            debug!(target_kind = %target, %module, "module unknown to bundler graph; not build-worthy");
            return;
        }

        if is_test_file && kind.alters_file_set() {
            state.import_aggregate_stale = true;
        }
        let seq = self.next_seq();
        let state = self.state_mut(target);
        state.changed_modules.record(module.clone(), kind, seq);

        info!(target_kind = %target, %module, %kind, "module changed");
        step.commands.push(CoreCommand::Notify(Notification::ModuleChanged {
            target,
            module,
            kind,
        }));

        self.arm_build(target, now);
    }

    fn arm_build(&mut self, target: TargetKind, now: Instant) {
        let pending = match self.timer.action() {
            Some(TimerAction::Build(current)) => Some(current),
            _ => None,
        };
        let target = merge_build_targets(pending, target);
        self.timer
            .arm(now + self.settings.batch_delay, TimerAction::Build(target));
    }
}
