// src/build/mod.rs

//! Per-target build bookkeeping.
//!
//! - [`naming`] turns filesystem paths into bundler module names.
//! - [`changes`] is the deduplicated set of modules changed since the last
//!   successful build.
//! - [`state`] is the per-target [`BuildState`] record.

pub mod changes;
pub mod naming;
pub mod state;

pub use changes::{ChangedModule, ChangedModules};
pub use naming::module_name;
pub use state::BuildState;
