// src/watch/mod.rs

//! File watching and change classification.
//!
//! This module is responsible for:
//! - Compiling the `watch` / `ignore` glob patterns and the test-file matcher.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Deciding which target a changed path belongs to and under which module
//!   name.
//!
//! It does **not** decide when to build; it only turns filesystem changes
//! into `RuntimeEvent::FileChanged`.

pub mod classify;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use classify::{Classification, ModuleChange, classify};
pub use patterns::{TestFileMatcher, WatchFilter, collect_test_files};
pub use watcher::{WatcherHandle, spawn_watcher};
