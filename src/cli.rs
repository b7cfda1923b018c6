// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

use crate::config::StartFlags;

/// Command-line arguments for `bundlewatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "bundlewatch",
    version,
    about = "Watch sources and incrementally rebuild the app and test bundles.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Bundlewatch.toml` in the current working directory.
    #[arg(long, value_name = "PATH", default_value = "Bundlewatch.toml")]
    pub config: String,

    /// Build only the application bundle.
    #[arg(long, conflicts_with = "tests_only")]
    pub app_only: bool,

    /// Build only the test bundle.
    #[arg(long)]
    pub tests_only: bool,

    /// Run the initial builds once, no watching.
    #[arg(long)]
    pub once: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `BUNDLEWATCH_LOG`, the config's `debug` flag or a default
    /// level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the resolved targets, but don't build.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    pub fn start_flags(&self) -> StartFlags {
        StartFlags {
            app_only: self.app_only,
            tests_only: self.tests_only,
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = CliArgs::try_parse_from(["bundlewatch"]).unwrap();
        assert_eq!(args.config, "Bundlewatch.toml");
        assert!(!args.once);
        assert!(!args.start_flags().app_only);
    }

    #[test]
    fn app_only_and_tests_only_conflict() {
        assert!(CliArgs::try_parse_from(["bundlewatch", "--app-only", "--tests-only"]).is_err());
    }
}
