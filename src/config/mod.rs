// src/config/mod.rs

//! Configuration loading and validation for bundlewatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`) and bundler options
//!   (`options.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate the construction-time invariants (`validate.rs`).
//! - Resolve everything against the project root into the engine's
//!   runtime settings (`settings.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod settings;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{
    BundlerSection, ConfigFile, ConfigSection, EnabledTargets, ProjectSection, RawConfigFile,
    StartFlags, TargetConfig,
};
pub use options::{BuildOptions, BuildOptionsOverrides};
pub use settings::{EngineSettings, TargetSettings};
