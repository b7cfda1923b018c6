// src/config/options.rs

//! Bundler options per target.
//!
//! `[app.build_options]` / `[tests.build_options]` only carry overrides;
//! [`BuildOptions::merged`] lays them over the defaults.

use serde::Deserialize;

/// Fully resolved options handed to the bundler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    pub minify: bool,
    pub mangle: bool,
    pub source_maps: bool,
    pub low_res_source_maps: bool,
    /// Emit a regular (loader-registered) bundle rather than a
    /// self-executing one.
    pub force_non_sfx: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            minify: false,
            mangle: false,
            source_maps: true,
            low_res_source_maps: true,
            force_non_sfx: true,
        }
    }
}

/// Optional per-field overrides from the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct BuildOptionsOverrides {
    #[serde(default)]
    pub minify: Option<bool>,
    #[serde(default)]
    pub mangle: Option<bool>,
    #[serde(default)]
    pub source_maps: Option<bool>,
    #[serde(default)]
    pub low_res_source_maps: Option<bool>,
    #[serde(default)]
    pub force_non_sfx: Option<bool>,
}

impl BuildOptions {
    /// Defaults with `overrides` applied on top.
    pub fn merged(overrides: &BuildOptionsOverrides) -> Self {
        let d = Self::default();
        Self {
            minify: overrides.minify.unwrap_or(d.minify),
            mangle: overrides.mangle.unwrap_or(d.mangle),
            source_maps: overrides.source_maps.unwrap_or(d.source_maps),
            low_res_source_maps: overrides
                .low_res_source_maps
                .unwrap_or(d.low_res_source_maps),
            force_non_sfx: overrides.force_non_sfx.unwrap_or(d.force_non_sfx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_overrides_yield_defaults() {
        assert_eq!(
            BuildOptions::merged(&BuildOptionsOverrides::default()),
            BuildOptions::default()
        );
    }

    #[test]
    fn overrides_replace_only_their_fields() {
        let overrides = BuildOptionsOverrides {
            minify: Some(true),
            source_maps: Some(false),
            ..Default::default()
        };
        let opts = BuildOptions::merged(&overrides);
        assert!(opts.minify);
        assert!(!opts.source_maps);
        assert!(!opts.mangle);
        assert!(opts.low_res_source_maps);
        assert!(opts.force_non_sfx);
    }
}
