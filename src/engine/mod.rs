// src/engine/mod.rs

//! Orchestration engine for bundlewatch.
//!
//! This module ties together:
//! - the two per-target build states (`app`, `tests`)
//! - the single debounce timer shared by module builds and configuration
//!   reloads
//! - the queue of filesystem events that arrive while a build is running
//! - the main runtime event loop that reacts to:
//!   - filesystem changes
//!   - build completions
//!   - timer expiry
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`] (decision logic for file
//! events in [`event_handlers`]); the async/IO shell is implemented in
//! [`runtime`].

use std::path::PathBuf;

use crate::build::BuildState;
use crate::bundler::BundleJob;
use crate::bundler::aggregate::AggregatePlan;
use crate::types::{ChangeKind, TargetKind};

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;
pub mod timer;

pub use self::core::{CONFIG_CHANGE_DELAY, CoreRuntime, Pipeline};
pub use queue::{EventQueue, PendingEvent};
pub use runtime::Runtime;
pub use timer::{TimerAction, TimerSlot};

/// Result of one bundler invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed(String),
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }
}

/// A build the shell should run.
#[derive(Debug, Clone)]
pub struct BuildPlan {
    /// Engine generation the plan belongs to; results for an older
    /// generation are discarded.
    pub generation: u64,
    pub job: BundleJob,
    /// Tests target only.
    pub aggregate: Option<AggregatePlan>,
}

impl BuildPlan {
    pub fn target(&self) -> TargetKind {
        self.job.target
    }
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// Exit once the initial builds have finished and nothing is pending
    /// (`--once`).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the watcher, build tasks, etc.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A watched path changed on disk.
    FileChanged { path: PathBuf, kind: ChangeKind },
    /// A bundler invocation finished.
    BuildFinished {
        target: TargetKind,
        generation: u64,
        outcome: BuildOutcome,
    },
    /// The core's timer deadline passed.
    TimerElapsed,
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Lifecycle notifications observable by callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// A build is about to start; `state` is the target's state right before.
    BeforeBuild { target: TargetKind, state: BuildState },
    /// A build-worthy module change was recorded.
    ModuleChanged {
        target: TargetKind,
        module: String,
        kind: ChangeKind,
    },
    /// A build finished.
    Change { target: TargetKind, has_error: bool },
    /// The first build after startup finished. Emitted once per process.
    Started,
    /// The dependency configuration changed; the engine is re-initializing.
    ConfigChanged,
}

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Run this build on a background task and report `BuildFinished`.
    StartBuild(BuildPlan),
    /// Reload the project layout, reset the bundler graph and call
    /// [`CoreRuntime::reinitialize`].
    Reinitialize,
    /// Publish a lifecycle notification.
    Notify(Notification),
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, Default)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    pub(crate) fn running() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}
