// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s (plus the current time) and produces:
//! - an updated core state
//! - a list of [`CoreCommand`]s describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels and sleeping until the timer deadline
//! - running bundler invocations on background tasks
//! - reloading the project layout on re-initialization
//! - publishing notifications and handling Ctrl+C
//!
//! Build pipeline: `Idle → AppBuilding → TestsBuilding → Idle`. The app step
//! is skipped when the app target is disabled (or the trigger was a test
//! change); the tests step is skipped when tests are disabled or the app
//! build failed. Queued filesystem events are replayed only once the
//! pipeline is back at `Idle`.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::build::{BuildState, ChangedModule, module_name};
use crate::bundler::aggregate::AggregatePlan;
use crate::bundler::{BundleJob, ModuleGraph};
use crate::config::EngineSettings;
use crate::engine::queue::EventQueue;
use crate::engine::timer::{TimerAction, TimerSlot};
use crate::engine::{
    BuildOutcome, BuildPlan, CoreCommand, CoreStep, Notification, RuntimeEvent, RuntimeOptions,
};
use crate::project::ProjectLayout;
use crate::types::TargetKind;

/// Quiet period after the last event before a dependency-configuration change
/// triggers a full re-initialization.
pub const CONFIG_CHANGE_DELAY: Duration = Duration::from_millis(2000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Idle,
    AppBuilding,
    TestsBuilding,
}

/// Pure core runtime state.
///
/// It has **no** channels and does not perform any IO. The module graph it
/// holds is only used for in-memory invalidation.
pub struct CoreRuntime {
    pub(super) settings: EngineSettings,
    pub(super) graph: Arc<dyn ModuleGraph>,
    pub(super) options: RuntimeOptions,
    pub(super) app: BuildState,
    pub(super) tests: BuildState,
    pub(super) queue: EventQueue,
    pub(super) timer: TimerSlot,
    pub(super) pipeline: Pipeline,
    /// The dependency configuration changed and a reload is being debounced.
    pub(super) processing_change: bool,
    /// Reload timer fired while a build was running.
    pub(super) reinit_pending: bool,
    /// `Reinitialize` was handed to the shell and not yet answered.
    pub(super) awaiting_reinit: bool,
    /// Build timer fired while the pipeline was busy.
    pub(super) deferred_build: Option<TargetKind>,
    /// Changes carried by the app build currently running; merged into the
    /// tests target when the app build chains into a test build.
    pub(super) app_build_changes: Vec<ChangedModule>,
    pub(super) started: bool,
    pub(super) generation: u64,
    pub(super) next_seq: u64,
}

impl fmt::Debug for CoreRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreRuntime")
            .field("pipeline", &self.pipeline)
            .field("app", &self.app)
            .field("tests", &self.tests)
            .field("queue", &self.queue)
            .field("timer", &self.timer)
            .field("processing_change", &self.processing_change)
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

impl CoreRuntime {
    pub fn new(
        settings: EngineSettings,
        graph: Arc<dyn ModuleGraph>,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            settings,
            graph,
            options,
            app: BuildState::new(TargetKind::App),
            tests: BuildState::new(TargetKind::Tests),
            queue: EventQueue::new(),
            timer: TimerSlot::new(),
            pipeline: Pipeline::Idle,
            processing_change: false,
            reinit_pending: false,
            awaiting_reinit: false,
            deferred_build: None,
            app_build_changes: Vec::new(),
            started: false,
            generation: 0,
            next_seq: 0,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn options(&self) -> RuntimeOptions {
        self.options
    }

    pub fn state(&self, kind: TargetKind) -> &BuildState {
        match kind {
            TargetKind::App => &self.app,
            TargetKind::Tests => &self.tests,
        }
    }

    pub(super) fn state_mut(&mut self, kind: TargetKind) -> &mut BuildState {
        match kind {
            TargetKind::App => &mut self.app,
            TargetKind::Tests => &mut self.tests,
        }
    }

    pub fn pipeline(&self) -> Pipeline {
        self.pipeline
    }

    /// When the shell should wake the core with `TimerElapsed`.
    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn pending_timer(&self) -> Option<TimerAction> {
        self.timer.action()
    }

    pub fn is_processing_config_change(&self) -> bool {
        self.processing_change
    }

    pub fn queued_events(&self) -> usize {
        self.queue.len()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(super) fn any_in_progress(&self) -> bool {
        self.app.in_progress || self.tests.in_progress
    }

    /// No build running or scheduled and nothing waiting to be replayed.
    pub fn is_idle(&self) -> bool {
        self.pipeline == Pipeline::Idle
            && !self.timer.is_armed()
            && self.queue.is_empty()
            && !self.reinit_pending
            && !self.awaiting_reinit
            && self.deferred_build.is_none()
    }

    /// Enabled targets whose last build failed.
    pub fn failed_targets(&self) -> Vec<TargetKind> {
        [TargetKind::App, TargetKind::Tests]
            .into_iter()
            .filter(|&k| self.settings.is_enabled(k) && self.state(k).has_error)
            .collect()
    }

    pub(super) fn next_seq(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// Kick off the initial full-build sequence.
    pub fn start(&mut self) -> CoreStep {
        let mut step = CoreStep::running();
        self.start_initial_sequence(&mut step);
        step
    }

    /// Answer to [`CoreCommand::Reinitialize`]: adopt the reloaded layout,
    /// recreate both build states and rerun the initial sequence.
    pub fn reinitialize(&mut self, layout: ProjectLayout) -> CoreStep {
        self.awaiting_reinit = false;
        self.settings.layout = layout;
        self.app = BuildState::new(TargetKind::App);
        self.tests = BuildState::new(TargetKind::Tests);
        self.app_build_changes.clear();
        self.generation += 1;
        info!(generation = self.generation, "build engine re-initialized");

        let mut step = CoreStep::running();
        self.start_initial_sequence(&mut step);
        step
    }

    fn start_initial_sequence(&mut self, step: &mut CoreStep) {
        if self.settings.is_enabled(TargetKind::App) {
            self.begin_build(TargetKind::App, step);
        } else if self.settings.is_enabled(TargetKind::Tests) {
            self.begin_build(TargetKind::Tests, step);
        } else {
            // Rejected when the settings were built.
            warn!("no enabled target; nothing to build");
        }
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent, now: Instant) -> CoreStep {
        let mut step = CoreStep::running();

        match event {
            RuntimeEvent::FileChanged { path, kind } => {
                self.handle_file_event(path, kind, now, &mut step);
            }
            RuntimeEvent::BuildFinished {
                target,
                generation,
                outcome,
            } => {
                self.handle_build_finished(target, generation, outcome, now, &mut step);
            }
            RuntimeEvent::TimerElapsed => self.handle_timer(now, &mut step),
            RuntimeEvent::ShutdownRequested => step.keep_running = false,
        }

        if self.options.exit_when_idle && self.is_idle() {
            debug!("idle with nothing pending; requesting exit");
            step.keep_running = false;
        }

        step
    }

    fn handle_timer(&mut self, now: Instant, step: &mut CoreStep) {
        let Some(action) = self.timer.take_due(now) else {
            return;
        };

        match action {
            TimerAction::Reinitialize => {
                if self.pipeline != Pipeline::Idle {
                    debug!("configuration reload due while building; deferring until idle");
                    self.reinit_pending = true;
                    return;
                }
                self.fire_reinitialize(step);
            }
            TimerAction::Build(target) => {
                if self.pipeline != Pipeline::Idle {
                    let merged = merge_build_targets(self.deferred_build, target);
                    debug!(target_kind = %merged, "build due while building; deferring until idle");
                    self.deferred_build = Some(merged);
                    return;
                }
                self.begin_build(target, step);
            }
        }
    }

    fn fire_reinitialize(&mut self, step: &mut CoreStep) {
        self.reinit_pending = false;
        self.processing_change = false;
        if self.timer.action() == Some(TimerAction::Reinitialize) {
            self.timer.cancel();
        }
        self.deferred_build = None;
        let dropped = self.queue.drain_pending().len();
        if dropped > 0 {
            debug!(dropped, "full rebuild supersedes queued events");
        }

        info!("dependency configuration changed; re-initializing build engine");
        self.awaiting_reinit = true;
        step.commands.push(CoreCommand::Notify(Notification::ConfigChanged));
        step.commands.push(CoreCommand::Reinitialize);
    }

    /// Start a bundler invocation for `target`.
    pub(super) fn begin_build(&mut self, target: TargetKind, step: &mut CoreStep) {
        let Some(target_settings) = self.settings.target(target).cloned() else {
            warn!(target_kind = %target, "build requested for disabled target; ignoring");
            return;
        };

        let aggregate = if target == TargetKind::Tests {
            Some(AggregatePlan {
                entry: target_settings.input.clone(),
                root: self.settings.root.clone(),
                matcher: self.settings.test_files.clone(),
                skip_dirs: vec![self.settings.layout.packages_dir.clone()],
                regenerate: self.tests.import_aggregate_stale,
                loader_module: module_name(&target_settings.input, &self.settings.layout.base_dir),
            })
        } else {
            None
        };

        let generation = self.generation;
        let state = self.state_mut(target);
        step.commands.push(CoreCommand::Notify(Notification::BeforeBuild {
            target,
            state: state.clone(),
        }));

        if state.is_full_rebuild {
            info!(
                target_kind = %target,
                input = ?target_settings.input,
                output = ?target_settings.output,
                "full {target} build"
            );
        } else {
            info!(
                target_kind = %target,
                "incremental {target} build: {}",
                state.changed_modules.summary()
            );
        }

        state.import_aggregate_stale = false;
        state.begin();
        let changes = state.changed_modules.to_vec();
        let full_rebuild = state.is_full_rebuild;

        if target == TargetKind::App {
            self.app_build_changes = changes.clone();
        }
        self.pipeline = match target {
            TargetKind::App => Pipeline::AppBuilding,
            TargetKind::Tests => Pipeline::TestsBuilding,
        };

        step.commands.push(CoreCommand::StartBuild(BuildPlan {
            generation,
            job: BundleJob {
                target,
                entry: target_settings.input,
                output: target_settings.output,
                options: target_settings.options,
                full_rebuild,
                changes,
            },
            aggregate,
        }));
    }

    fn handle_build_finished(
        &mut self,
        target: TargetKind,
        generation: u64,
        outcome: BuildOutcome,
        now: Instant,
        step: &mut CoreStep,
    ) {
        if generation != self.generation {
            debug!(target_kind = %target, generation, "ignoring result from previous engine generation");
            return;
        }
        if !self.state(target).in_progress {
            warn!(target_kind = %target, "build result for a target that was not building; ignoring");
            return;
        }

        let success = outcome.is_success();
        match &outcome {
            BuildOutcome::Success => info!(target_kind = %target, "{target} build succeeded"),
            BuildOutcome::Failed(err) => {
                error!(target_kind = %target, error = %err, "{target} build failed")
            }
        }

        let state = self.state_mut(target);
        state.finish(success);
        if target == TargetKind::Tests && !success {
            // The aggregate may be half-written or out of date; rebuild it.
            state.import_aggregate_stale = true;
        }
        let has_error = state.has_error;

        self.pipeline = Pipeline::Idle;
        step.commands.push(CoreCommand::Notify(Notification::Change { target, has_error }));
        if !self.started {
            self.started = true;
            step.commands.push(CoreCommand::Notify(Notification::Started));
        }

        let app_changes = std::mem::take(&mut self.app_build_changes);
        if target == TargetKind::App
            && success
            && self.settings.is_enabled(TargetKind::Tests)
            && !self.reinit_pending
        {
            self.tests.changed_modules.merge_newest(&app_changes);
            self.begin_build(TargetKind::Tests, step);
            return;
        }

        self.settle(now, step);
    }

    /// The pipeline just went idle: run whatever was deferred, otherwise
    /// replay queued events.
    fn settle(&mut self, now: Instant, step: &mut CoreStep) {
        if self.reinit_pending {
            self.fire_reinitialize(step);
            return;
        }
        if let Some(target) = self.deferred_build.take() {
            self.begin_build(target, step);
            return;
        }
        for event in self.queue.drain_pending() {
            self.handle_file_event(event.path, event.kind, now, step);
        }
    }
}

/// Combine two pending build triggers into one.
///
/// An app build already chains into the tests build (with the tests changes
/// included), so `App` subsumes `Tests`.
///
/// NOTE: a later tests trigger does not replace a pending app trigger the way
/// a plain last-write-wins timer would; it is folded into it so the app's
/// pending changes are never dropped.
pub(super) fn merge_build_targets(current: Option<TargetKind>, next: TargetKind) -> TargetKind {
    match (current, next) {
        (Some(TargetKind::App), _) | (_, TargetKind::App) => TargetKind::App,
        _ => TargetKind::Tests,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::config::{BuildOptions, TargetSettings};
    use crate::types::ChangeKind;
    use crate::watch::patterns::TestFileMatcher;

    /// Graph that knows a fixed set of modules (or every module).
    #[derive(Debug, Default)]
    struct FakeGraph {
        know_all: bool,
        known: Mutex<HashSet<String>>,
    }

    impl ModuleGraph for FakeGraph {
        fn invalidate(&self, module: &str) -> Vec<String> {
            if self.know_all || self.known.lock().unwrap().contains(module) {
                vec![module.to_string()]
            } else {
                Vec::new()
            }
        }

        fn reset(&self) {}
    }

    fn target(kind: TargetKind, input: &str, output: &str) -> TargetSettings {
        let input = PathBuf::from(input);
        TargetSettings {
            kind,
            input_dir: input.parent().unwrap().to_path_buf(),
            input,
            output: PathBuf::from(output),
            options: BuildOptions::default(),
        }
    }

    fn settings(app: bool, tests: bool) -> EngineSettings {
        let root = Path::new("/proj");
        EngineSettings {
            root: root.to_path_buf(),
            package_json: root.join("package.json"),
            batch_delay: Duration::from_millis(250),
            app: app.then(|| target(TargetKind::App, "/proj/src/main.js", "/proj/dist/app.js")),
            tests: tests.then(|| {
                target(TargetKind::Tests, "/proj/test/index.js", "/proj/dist/tests.js")
            }),
            test_files: TestFileMatcher::new(&["test/**/*.spec.js".to_string()]).unwrap(),
            layout: ProjectLayout::defaults(root),
        }
    }

    fn core_with(app: bool, tests: bool, know_all: bool) -> CoreRuntime {
        let graph = Arc::new(FakeGraph {
            know_all,
            ..FakeGraph::default()
        });
        CoreRuntime::new(settings(app, tests), graph, RuntimeOptions::default())
    }

    fn builds(step: &CoreStep) -> Vec<BuildPlan> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::StartBuild(plan) => Some(plan.clone()),
                _ => None,
            })
            .collect()
    }

    fn notifications(step: &CoreStep) -> Vec<Notification> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::Notify(n) => Some(n.clone()),
                _ => None,
            })
            .collect()
    }

    fn finished(target: TargetKind, outcome: BuildOutcome) -> RuntimeEvent {
        RuntimeEvent::BuildFinished {
            target,
            generation: 0,
            outcome,
        }
    }

    fn changed(path: &str, kind: ChangeKind) -> RuntimeEvent {
        RuntimeEvent::FileChanged {
            path: PathBuf::from(path),
            kind,
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    /// Run the initial app + tests builds to completion.
    fn started_core(know_all: bool) -> (CoreRuntime, Instant) {
        let t0 = Instant::now();
        let mut core = core_with(true, true, know_all);
        core.start();
        core.step(finished(TargetKind::App, BuildOutcome::Success), t0);
        core.step(finished(TargetKind::Tests, BuildOutcome::Success), t0);
        assert!(core.is_idle());
        (core, t0)
    }

    #[test]
    fn startup_builds_app_then_tests() {
        let t0 = Instant::now();
        let mut core = core_with(true, true, true);

        let step = core.start();
        let plans = builds(&step);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].target(), TargetKind::App);
        assert!(plans[0].job.full_rebuild);
        assert!(plans[0].aggregate.is_none());
        assert_eq!(core.pipeline(), Pipeline::AppBuilding);
        assert!(matches!(
            notifications(&step).as_slice(),
            [Notification::BeforeBuild { target: TargetKind::App, .. }]
        ));

        let step = core.step(finished(TargetKind::App, BuildOutcome::Success), t0);
        assert_eq!(
            notifications(&step)[..2],
            [
                Notification::Change {
                    target: TargetKind::App,
                    has_error: false
                },
                Notification::Started,
            ]
        );
        let plans = builds(&step);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].target(), TargetKind::Tests);
        let aggregate = plans[0].aggregate.as_ref().expect("tests build carries aggregate");
        assert!(aggregate.regenerate);
        assert_eq!(aggregate.loader_module, "test/index.js");
        assert_eq!(core.pipeline(), Pipeline::TestsBuilding);

        let step = core.step(finished(TargetKind::Tests, BuildOutcome::Success), t0);
        assert_eq!(
            notifications(&step),
            vec![Notification::Change {
                target: TargetKind::Tests,
                has_error: false
            }]
        );
        assert!(builds(&step).is_empty());
        assert!(!core.state(TargetKind::App).is_full_rebuild);
        assert!(!core.state(TargetKind::Tests).is_full_rebuild);
    }

    #[test]
    fn tests_only_startup_builds_tests_directly() {
        let mut core = core_with(false, true, true);
        let plans = builds(&core.start());
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].target(), TargetKind::Tests);
    }

    #[test]
    fn failed_app_build_does_not_chain_tests() {
        let t0 = Instant::now();
        let mut core = core_with(true, true, true);
        core.start();

        let step = core.step(
            finished(TargetKind::App, BuildOutcome::Failed("boom".into())),
            t0,
        );
        assert!(builds(&step).is_empty());
        assert!(core.state(TargetKind::App).has_error);
        assert_eq!(core.failed_targets(), vec![TargetKind::App]);
        assert!(notifications(&step).contains(&Notification::Started));
    }

    #[test]
    fn burst_of_changes_produces_one_build_with_union() {
        let (mut core, t0) = started_core(true);

        core.step(changed("/proj/src/a.js", ChangeKind::Created), t0);
        core.step(changed("/proj/src/b.js", ChangeKind::Modified), t0 + ms(100));
        let step = core.step(changed("/proj/src/a.js", ChangeKind::Modified), t0 + ms(200));
        assert_eq!(
            notifications(&step),
            vec![Notification::ModuleChanged {
                target: TargetKind::App,
                module: "a.js".into(),
                kind: ChangeKind::Modified,
            }]
        );
        assert_eq!(core.deadline(), Some(t0 + ms(450)));

        let step = core.step(RuntimeEvent::TimerElapsed, t0 + ms(300));
        assert!(step.commands.is_empty());

        let step = core.step(RuntimeEvent::TimerElapsed, t0 + ms(450));
        let plans = builds(&step);
        assert_eq!(plans.len(), 1);
        let job = &plans[0].job;
        assert_eq!(job.target, TargetKind::App);
        assert!(!job.full_rebuild);
        let summary: Vec<_> = job.changes.iter().map(|m| (m.name.as_str(), m.kind)).collect();
        assert_eq!(
            summary,
            vec![("b.js", ChangeKind::Modified), ("a.js", ChangeKind::Modified)]
        );
    }

    #[test]
    fn app_changes_are_merged_into_chained_test_build() {
        let (mut core, t0) = started_core(true);

        core.step(changed("/proj/src/util.js", ChangeKind::Modified), t0);
        core.step(RuntimeEvent::TimerElapsed, t0 + ms(250));
        let step = core.step(finished(TargetKind::App, BuildOutcome::Success), t0 + ms(300));

        let plans = builds(&step);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].target(), TargetKind::Tests);
        let names: Vec<_> = plans[0].job.changes.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["util.js"]);
        assert!(!plans[0].aggregate.as_ref().unwrap().regenerate);
    }

    #[test]
    fn unknown_module_only_builds_after_failure() {
        let (mut core, t0) = started_core(false);

        let step = core.step(changed("/proj/src/unknown.js", ChangeKind::Modified), t0);
        assert!(step.commands.is_empty());
        assert!(!core.timer.is_armed());

        let t0 = Instant::now();
        let mut core = core_with(true, true, false);
        core.start();
        core.step(
            finished(TargetKind::App, BuildOutcome::Failed("syntax".into())),
            t0,
        );
        let step = core.step(changed("/proj/src/unknown.js", ChangeKind::Modified), t0);
        assert_eq!(notifications(&step).len(), 1);
        assert_eq!(
            core.pending_timer(),
            Some(TimerAction::Build(TargetKind::App))
        );
    }

    #[test]
    fn tests_only_fallback_needs_known_module_or_failed_build() {
        let t0 = Instant::now();
        let mut core = core_with(false, true, false);
        core.start();
        core.step(finished(TargetKind::Tests, BuildOutcome::Success), t0);
        assert!(core.is_idle());

        let step = core.step(changed("/proj/test/helpers/dom.js", ChangeKind::Modified), t0);
        assert!(step.commands.is_empty());
        assert!(!core.timer.is_armed());
        assert!(core.state(TargetKind::Tests).changed_modules.is_empty());

        let mut core = core_with(false, true, false);
        core.start();
        core.step(
            finished(TargetKind::Tests, BuildOutcome::Failed("boom".into())),
            t0,
        );
        let step = core.step(changed("/proj/test/helpers/dom.js", ChangeKind::Modified), t0);
        assert_eq!(
            notifications(&step),
            vec![Notification::ModuleChanged {
                target: TargetKind::Tests,
                module: "helpers/dom.js".into(),
                kind: ChangeKind::Modified,
            }]
        );
        assert_eq!(
            core.pending_timer(),
            Some(TimerAction::Build(TargetKind::Tests))
        );
    }

    #[test]
    fn spec_file_unknown_to_graph_still_builds() {
        let t0 = Instant::now();
        let mut core = core_with(false, true, false);
        core.start();
        core.step(finished(TargetKind::Tests, BuildOutcome::Success), t0);

        let step = core.step(changed("/proj/test/unit/a.spec.js", ChangeKind::Modified), t0);
        assert_eq!(notifications(&step).len(), 1);
        assert_eq!(
            core.pending_timer(),
            Some(TimerAction::Build(TargetKind::Tests))
        );
        // A plain modification leaves the file set alone.
        assert!(!core.state(TargetKind::Tests).import_aggregate_stale);
    }

    #[test]
    fn failed_build_keeps_changes_until_success() {
        let (mut core, t0) = started_core(true);

        core.step(changed("/proj/src/a.js", ChangeKind::Modified), t0);
        core.step(RuntimeEvent::TimerElapsed, t0 + ms(250));
        core.step(
            finished(TargetKind::App, BuildOutcome::Failed("nope".into())),
            t0 + ms(300),
        );
        let app = core.state(TargetKind::App);
        assert!(app.has_error);
        assert_eq!(app.changed_modules.len(), 1);

        core.step(changed("/proj/src/b.js", ChangeKind::Modified), t0 + ms(400));
        let plans = builds(&core.step(RuntimeEvent::TimerElapsed, t0 + ms(650)));
        assert_eq!(plans[0].job.changes.len(), 2);

        core.step(finished(TargetKind::App, BuildOutcome::Success), t0 + ms(700));
        let app = core.state(TargetKind::App);
        assert!(!app.has_error);
        assert!(app.changed_modules.is_empty());
    }

    #[test]
    fn created_test_file_marks_aggregate_stale() {
        let (mut core, t0) = started_core(false);

        let step = core.step(changed("/proj/test/foo.spec.js", ChangeKind::Created), t0);
        assert_eq!(
            notifications(&step),
            vec![Notification::ModuleChanged {
                target: TargetKind::Tests,
                module: "foo.spec.js".into(),
                kind: ChangeKind::Created,
            }]
        );
        assert!(core.state(TargetKind::Tests).import_aggregate_stale);

        let plans = builds(&core.step(RuntimeEvent::TimerElapsed, t0 + ms(250)));
        assert_eq!(plans[0].target(), TargetKind::Tests);
        assert!(plans[0].aggregate.as_ref().unwrap().regenerate);
        assert!(!core.state(TargetKind::Tests).import_aggregate_stale);
    }

    #[test]
    fn failed_test_build_marks_aggregate_stale() {
        let t0 = Instant::now();
        let mut core = core_with(true, true, true);
        core.start();
        core.step(finished(TargetKind::App, BuildOutcome::Success), t0);
        core.step(
            finished(TargetKind::Tests, BuildOutcome::Failed("x".into())),
            t0,
        );
        let tests = core.state(TargetKind::Tests);
        assert!(tests.has_error);
        assert!(tests.import_aggregate_stale);
    }

    #[test]
    fn events_during_build_are_queued_and_replayed() {
        let t0 = Instant::now();
        let mut core = core_with(true, true, true);
        core.start();

        let step = core.step(changed("/proj/src/a.js", ChangeKind::Modified), t0);
        assert!(step.commands.is_empty());
        assert_eq!(core.queued_events(), 1);

        // App done; chained tests build still running, queue untouched.
        core.step(finished(TargetKind::App, BuildOutcome::Success), t0);
        assert_eq!(core.queued_events(), 1);

        let step = core.step(finished(TargetKind::Tests, BuildOutcome::Success), t0 + ms(10));
        assert_eq!(core.queued_events(), 0);
        assert!(notifications(&step).contains(&Notification::ModuleChanged {
            target: TargetKind::App,
            module: "a.js".into(),
            kind: ChangeKind::Modified,
        }));
        assert_eq!(core.deadline(), Some(t0 + ms(260)));
    }

    #[test]
    fn config_change_extends_timer_then_reinitializes() {
        let (mut core, t0) = started_core(true);

        core.step(changed("/proj/config.js", ChangeKind::Modified), t0);
        assert!(core.is_processing_config_change());
        assert_eq!(core.pending_timer(), Some(TimerAction::Reinitialize));

        let step = core.step(changed("/proj/src/a.js", ChangeKind::Modified), t0 + ms(500));
        assert!(step.commands.is_empty());
        assert_eq!(core.deadline(), Some(t0 + ms(2500)));

        let step = core.step(RuntimeEvent::TimerElapsed, t0 + ms(2000));
        assert!(step.commands.is_empty());

        let step = core.step(RuntimeEvent::TimerElapsed, t0 + ms(2500));
        assert!(notifications(&step).contains(&Notification::ConfigChanged));
        assert!(
            step.commands
                .iter()
                .any(|c| matches!(c, CoreCommand::Reinitialize))
        );
        assert!(builds(&step).is_empty());
        assert!(!core.is_processing_config_change());

        let layout = core.settings().layout.clone();
        let step = core.reinitialize(layout);
        assert_eq!(core.generation(), 1);
        assert!(core.state(TargetKind::App).is_full_rebuild);
        assert!(core.state(TargetKind::Tests).is_full_rebuild);
        let plans = builds(&step);
        assert_eq!(plans.len(), 1);
        assert_eq!(plans[0].generation, 1);
        assert!(plans[0].job.full_rebuild);
    }

    #[test]
    fn config_reload_due_during_build_waits_for_idle() {
        let t0 = Instant::now();
        let mut core = core_with(true, false, true);
        core.start();

        core.step(changed("/proj/config.js", ChangeKind::Modified), t0);
        let step = core.step(RuntimeEvent::TimerElapsed, t0 + ms(2000));
        assert!(step.commands.is_empty());
        assert!(core.reinit_pending);

        let step = core.step(finished(TargetKind::App, BuildOutcome::Success), t0 + ms(2100));
        assert!(
            step.commands
                .iter()
                .any(|c| matches!(c, CoreCommand::Reinitialize))
        );
    }

    #[test]
    fn results_from_previous_generation_are_ignored() {
        let t0 = Instant::now();
        let mut core = core_with(true, false, true);
        core.start();
        let layout = core.settings().layout.clone();
        core.reinitialize(layout);

        let step = core.step(finished(TargetKind::App, BuildOutcome::Success), t0);
        assert!(step.commands.is_empty());
        assert!(core.state(TargetKind::App).in_progress);
    }

    #[test]
    fn exit_when_idle_stops_after_initial_builds() {
        let t0 = Instant::now();
        let graph = Arc::new(FakeGraph::default());
        let options = RuntimeOptions {
            exit_when_idle: true,
        };
        let mut core = CoreRuntime::new(settings(true, true), graph, options);
        core.start();

        let step = core.step(finished(TargetKind::App, BuildOutcome::Success), t0);
        assert!(step.keep_running);
        let step = core.step(finished(TargetKind::Tests, BuildOutcome::Success), t0);
        assert!(!step.keep_running);
    }

    #[test]
    fn build_triggers_merge_towards_app() {
        assert_eq!(merge_build_targets(None, TargetKind::Tests), TargetKind::Tests);
        assert_eq!(
            merge_build_targets(Some(TargetKind::App), TargetKind::Tests),
            TargetKind::App
        );
        assert_eq!(
            merge_build_targets(Some(TargetKind::Tests), TargetKind::App),
            TargetKind::App
        );
    }
}
