// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{BundleWatchError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::BundleWatchError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let bundler = raw.bundler.ok_or(BundleWatchError::MissingBundler)?;
        Ok(ConfigFile::new_unchecked(
            raw.config, raw.project, bundler, raw.app, raw.tests,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_bundler(cfg)?;
    ensure_has_watch_target(cfg)?;
    ensure_something_buildable(cfg)?;
    validate_global_config(cfg)?;
    validate_patterns(cfg)?;
    Ok(())
}

fn ensure_has_bundler(cfg: &RawConfigFile) -> Result<()> {
    match &cfg.bundler {
        None => Err(BundleWatchError::MissingBundler),
        Some(b) if b.cmd.trim().is_empty() => Err(BundleWatchError::MissingBundler),
        Some(_) => Ok(()),
    }
}

fn ensure_has_watch_target(cfg: &RawConfigFile) -> Result<()> {
    if cfg.app.watch.iter().all(|p| p.trim().is_empty()) {
        return Err(BundleWatchError::NoWatchTarget);
    }
    Ok(())
}

fn ensure_something_buildable(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.app.is_buildable() && !cfg.tests.is_buildable() {
        return Err(BundleWatchError::NothingToBuild);
    }
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.batch_delay == 0 {
        return Err(BundleWatchError::ConfigError(
            "[config].batch_delay must be >= 1 ms (got 0)".to_string(),
        ));
    }

    if let Some(bundler) = &cfg.bundler {
        if let Some(pattern) = &bundler.trace_on_stdout {
            regex::Regex::new(pattern).map_err(|e| {
                BundleWatchError::ConfigError(format!(
                    "[bundler].trace_on_stdout is not a valid regex: {e}"
                ))
            })?;
        }
    }

    Ok(())
}

fn validate_patterns(cfg: &RawConfigFile) -> Result<()> {
    for pattern in cfg
        .app
        .watch
        .iter()
        .chain(cfg.app.ignore.iter())
        .chain(cfg.tests.watch.iter())
        .chain(cfg.tests.ignore.iter())
    {
        Glob::new(pattern)?;
    }
    Ok(())
}
