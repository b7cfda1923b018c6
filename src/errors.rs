// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleWatchError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Configuration error: no [bundler] section configured; a bundler is required")]
    MissingBundler,

    #[error("Configuration error: [app].watch must contain at least one pattern")]
    NoWatchTarget,

    #[error("Configuration error: nothing to build (neither [app] nor [tests] has both input and output)")]
    NothingToBuild,

    #[error("build failed for: {0}")]
    BuildFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("project metadata error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("invalid glob pattern: {0}")]
    GlobError(#[from] globset::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BundleWatchError>;
