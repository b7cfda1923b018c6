// src/bundler/mod.rs

//! The module bundler as seen by the engine.
//!
//! The engine only decides *when* to bundle and with which accumulated
//! changes; compiling, tracing and writing the bundle belong to the bundler.
//!
//! - [`Bundler`] / [`ModuleGraph`] are the capability traits. Tests plug in a
//!   fake; production uses [`CommandBundler`].
//! - [`command`] runs an external bundler command per build.
//! - [`aggregate`] writes the synthetic "import every test file" entry.
//! - [`driver`] performs one build for one target and reports the outcome.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use crate::build::ChangedModule;
use crate::config::BuildOptions;
use crate::types::TargetKind;

pub mod aggregate;
pub mod command;
pub mod driver;

pub use command::CommandBundler;
pub use driver::run_build;

/// Everything the bundler needs for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BundleJob {
    pub target: TargetKind,
    pub entry: PathBuf,
    pub output: PathBuf,
    pub options: BuildOptions,
    /// First build after (re)initialization.
    pub full_rebuild: bool,
    /// Modules changed since the last successful build of this target.
    pub changes: Vec<ChangedModule>,
}

/// The bundler's dependency graph / compile cache.
///
/// Implementations must be cheap and non-blocking: the engine calls these
/// inline while classifying filesystem events.
pub trait ModuleGraph: Send + Sync {
    /// Purge `module` (and anything cached for it) from the graph.
    ///
    /// Returns the purged entries; empty means the module was not known.
    fn invalidate(&self, module: &str) -> Vec<String>;

    /// Drop the whole graph (full engine re-initialization).
    fn reset(&self);
}

/// A module bundler.
pub trait Bundler: ModuleGraph {
    /// Bundle `job.entry` into `job.output`.
    ///
    /// The returned future must not borrow `self`; the runtime drives it on a
    /// separate Tokio task.
    fn bundle(
        &self,
        job: BundleJob,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'static>>;
}
