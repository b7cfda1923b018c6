// src/lib.rs

pub mod build;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod project;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::bundler::{CommandBundler, ModuleGraph};
use crate::cli::CliArgs;
use crate::config::{ConfigFile, EngineSettings};
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, RuntimeOptions};
use crate::errors::{BundleWatchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::project::ProjectLayout;
use crate::watch::WatchFilter;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project layout and engine settings
/// - the command bundler
/// - core runtime + async shell
/// - (optional) file watcher
/// - Ctrl-C handling
pub async fn run(args: CliArgs, cfg: ConfigFile) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let root = config_root_dir(&config_path);
    let root = root.canonicalize().unwrap_or(root);

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let package_json = root.join(&cfg.project().package_json);
    let layout = ProjectLayout::load(fs.as_ref(), &package_json)?;

    let settings = EngineSettings::from_config(&cfg, &root, args.start_flags(), layout)?;

    if args.dry_run {
        print_dry_run(&cfg, &settings);
        return Ok(());
    }

    let bundler = Arc::new(CommandBundler::new(cfg.bundler(), &root)?);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    // Optional file watcher (disabled in --once mode).
    let _watcher_handle = if !args.once {
        let filter = WatchFilter::from_settings(&cfg, &settings)?;
        Some(crate::watch::spawn_watcher(&root, filter, rt_tx.clone())?)
    } else {
        None
    };

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let options = RuntimeOptions {
        exit_when_idle: args.once,
    };

    info!(root = ?settings.root, "starting bundlewatch");

    let graph: Arc<dyn ModuleGraph> = bundler.clone();
    let core = CoreRuntime::new(settings, graph, options);
    let runtime = Runtime::new(core, rt_tx, rt_rx, bundler, fs);
    let core = runtime.run().await?;

    if args.once {
        let failed = core.failed_targets();
        if !failed.is_empty() {
            let names: Vec<&str> = failed.iter().map(|k| k.as_str()).collect();
            return Err(BundleWatchError::BuildFailed(names.join(", ")));
        }
    }

    Ok(())
}

/// Figure out the project root.
///
/// - If the config path has a non-empty parent (e.g. "web/Bundlewatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Bundlewatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Simple dry-run output: print resolved targets, options and layout.
fn print_dry_run(cfg: &ConfigFile, settings: &EngineSettings) {
    println!("bundlewatch dry-run");
    println!("  root = {}", settings.root.display());
    println!("  batch_delay = {}ms", settings.batch_delay.as_millis());
    println!("  bundler.cmd = {}", cfg.bundler().cmd);
    if let Some(ref trace) = cfg.bundler().trace_on_stdout {
        println!("  bundler.trace_on_stdout = {trace}");
    }
    println!();

    println!("project:");
    println!("  config_file = {}", settings.layout.config_file.display());
    println!("  base_dir = {}", settings.layout.base_dir.display());
    println!("  packages_dir = {}", settings.layout.packages_dir.display());
    println!();

    println!("targets:");
    for kind in [types::TargetKind::App, types::TargetKind::Tests] {
        let tc = cfg.target(kind);
        match settings.target(kind) {
            Some(target) => {
                println!("  - {kind}");
                println!("      input: {}", target.input.display());
                println!("      output: {}", target.output.display());
                if !tc.watch.is_empty() {
                    println!("      watch: {:?}", tc.watch);
                }
                if !tc.ignore.is_empty() {
                    println!("      ignore: {:?}", tc.ignore);
                }
                println!("      options: {:?}", target.options);
            }
            None => println!("  - {kind} (disabled)"),
        }
    }

    debug!("dry-run complete (no build)");
}
